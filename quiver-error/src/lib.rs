#![deny(missing_docs)]

//! This crate defines error & result types for Quiver.
//! It also contains a variety of useful macros for error handling.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{fmt, io};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The coarse classification of a [`QuiverError`].
///
/// Callers that need to react differently to malformed input, failing storage and exhausted
/// memory match on the kind rather than on individual variants, since errors may be wrapped
/// in [`QuiverError::Context`] on their way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range metadata, or data that the selected write path cannot carry.
    Format,
    /// A failure reported by the underlying byte source or sink.
    Io,
    /// A buffer could not be materialized.
    Allocation,
    /// The caller passed an argument that violates an API contract.
    Argument,
    /// The operation is not supported for the given input.
    Unsupported,
}

/// The top-level error type for Quiver.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum QuiverError {
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Box<Backtrace>),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Box<Backtrace>),
    /// Serialized bytes or metadata do not describe a valid message.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidFormat(ErrString, Box<Backtrace>),
    /// A function is not implemented for the given input.
    #[error("function {0} not implemented for {1}\nBacktrace:\n{2}")]
    NotImplemented(ErrString, ErrString, Box<Backtrace>),
    /// Memory for a buffer of the given number of bytes could not be reserved.
    #[error("failed to allocate {0} bytes\nBacktrace:\n{1}")]
    Allocation(usize, Box<Backtrace>),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<QuiverError>),
    /// A wrapper for IO errors.
    #[error(transparent)]
    IOError(#[from] io::Error),
}

impl QuiverError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        QuiverError::Context(msg.into(), Box::new(self))
    }

    /// The classification of this error, looking through any context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuiverError::InvalidFormat(..) => ErrorKind::Format,
            QuiverError::IOError(err) => match err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<QuiverError>())
            {
                Some(inner) => inner.kind(),
                None => ErrorKind::Io,
            },
            QuiverError::Allocation(..) => ErrorKind::Allocation,
            QuiverError::OutOfBounds(..) | QuiverError::InvalidArgument(..) => {
                ErrorKind::Argument
            }
            QuiverError::NotImplemented(..) => ErrorKind::Unsupported,
            QuiverError::Context(_, inner) => inner.kind(),
        }
    }

    /// Whether this error was caused by malformed or unsupported-by-this-path data.
    pub fn is_invalid_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}

impl Debug for QuiverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<QuiverError> for io::Error {
    fn from(value: QuiverError) -> Self {
        match value {
            QuiverError::IOError(err) => err,
            other => io::Error::other(other),
        }
    }
}

#[cfg(feature = "prost")]
impl From<prost::DecodeError> for QuiverError {
    fn from(value: prost::DecodeError) -> Self {
        QuiverError::InvalidFormat(
            format!("failed to decode message metadata: {value}").into(),
            Box::new(Backtrace::capture()),
        )
    }
}

#[cfg(feature = "prost")]
impl From<prost::EncodeError> for QuiverError {
    fn from(value: prost::EncodeError) -> Self {
        QuiverError::InvalidArgument(
            format!("failed to encode message metadata: {value}").into(),
            Box::new(Backtrace::capture()),
        )
    }
}

/// A type alias for Results that return QuiverErrors as their error type.
pub type QuiverResult<T> = Result<T, QuiverError>;

/// A trait for unwrapping a QuiverResult.
pub trait QuiverUnwrap {
    /// The type of the value being unwrapped.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn quiver_unwrap(self) -> Self::Output;
}

impl<T, E> QuiverUnwrap for Result<T, E>
where
    E: Into<QuiverError>,
{
    type Output = T;

    #[inline(always)]
    fn quiver_unwrap(self) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|err| quiver_panic!(err))
    }
}

/// A trait for expecting a QuiverResult or an Option.
pub trait QuiverExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn quiver_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> QuiverExpect for Result<T, E>
where
    E: Into<QuiverError>,
{
    type Output = T;

    #[inline(always)]
    fn quiver_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| quiver_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> QuiverExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn quiver_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err =
                QuiverError::InvalidArgument(msg.to_string().into(), Box::new(Backtrace::capture()));
            quiver_panic!(err)
        })
    }
}

/// A convenient macro for creating a QuiverError.
#[macro_export]
macro_rules! quiver_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::OutOfBounds($idx, $start, $stop, Box::new(Backtrace::capture()))
        )
    }};
    (NotImplemented: $func:expr, $by_whom:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::NotImplemented($func.into(), format!("{}", $by_whom).into(), Box::new(Backtrace::capture()))
        )
    }};
    (Allocation: $bytes:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::Allocation($bytes, Box::new(Backtrace::capture()))
        )
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::QuiverError::Context($msg.into(), Box::new($err))
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::QuiverError::$variant(format!($fmt, $($arg),*).into(), Box::new(Backtrace::capture()))
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a QuiverError.
#[macro_export]
macro_rules! quiver_bail {
    ($($tt:tt)+) => {
        return Err($crate::quiver_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a QuiverError in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! quiver_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::quiver_panic!($crate::quiver_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_panic!($crate::quiver_err!($variant: $fmt, $($arg),*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::QuiverError = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::quiver_panic!($crate::quiver_err!($fmt, $($arg),*))
    };
    ($err:expr) => {{
        let err: $crate::QuiverError = $err;
        panic!("{}", err)
    }};
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub const fn must_use(error: crate::QuiverError) -> crate::QuiverError {
        error
    }
}
