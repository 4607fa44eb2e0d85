use crate::QuiverResult;

/// Extension trait for QuiverResult
pub trait ResultExt<T>: private::Sealed {
    /// Flatten a nested [`QuiverResult`]. Helper function until <https://github.com/rust-lang/rust/issues/70142> is stabilized.
    fn flatten(self) -> QuiverResult<T>;
}

mod private {
    use crate::QuiverResult;

    pub trait Sealed {}

    impl<T> Sealed for QuiverResult<QuiverResult<T>> {}
}

impl<T> ResultExt<T> for QuiverResult<QuiverResult<T>> {
    fn flatten(self) -> QuiverResult<T> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}
