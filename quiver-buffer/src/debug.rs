use std::fmt::{Debug, Formatter};

/// The number of leading bytes shown when formatting a buffer.
const PREVIEW_BYTES: usize = 32;

/// Formats bytes as hex pairs, showing at most [`PREVIEW_BYTES`] of them.
pub(crate) struct HexPreview<'a>(pub(crate) &'a [u8]);

impl Debug for HexPreview<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().take(PREVIEW_BYTES).enumerate() {
            if i > 0 && i % 8 == 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        if self.0.len() > PREVIEW_BYTES {
            write!(f, " ...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HexPreview;

    #[test]
    fn groups_and_truncates() {
        assert_eq!(format!("{:?}", HexPreview(&[0x01, 0xab])), "01ab");
        assert_eq!(
            format!("{:?}", HexPreview(&[0u8; 9])),
            "0000000000000000 00"
        );
        assert!(format!("{:?}", HexPreview(&[7u8; 40])).ends_with("0707 ..."));
    }
}
