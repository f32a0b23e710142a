//! Stage 1: turn whatever the caller supplied into one UTF-8 string.
//!
//! Absence and emptiness are detected here but not acted on: the stage
//! returns a [`Md2PdfError`] and the caller decides whether to substitute
//! the placeholder (lenient) or propagate it (strict).

use crate::error::Md2PdfError;
use std::borrow::Cow;
use tracing::warn;

/// Decode raw input into text.
///
/// * `None` → [`Md2PdfError::MissingInput`]
/// * empty bytes, or text that is empty after trimming → [`Md2PdfError::EmptyInput`]
/// * invalid UTF-8 is decoded lossily (U+FFFD per bad sequence) with a warning
pub fn normalize_bytes(bytes: Option<&[u8]>) -> Result<Cow<'_, str>, Md2PdfError> {
    let bytes = bytes.ok_or(Md2PdfError::MissingInput)?;
    if bytes.is_empty() {
        return Err(Md2PdfError::EmptyInput);
    }
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(e) => {
            warn!(
                "Input is not valid UTF-8 (first bad byte at offset {}), decoding lossily",
                e.valid_up_to()
            );
            String::from_utf8_lossy(bytes)
        }
    };
    check_text(text)
}

/// Validate already-decoded text.
pub fn normalize_text(text: Option<&str>) -> Result<Cow<'_, str>, Md2PdfError> {
    let text = text.ok_or(Md2PdfError::MissingInput)?;
    check_text(Cow::Borrowed(text))
}

fn check_text(text: Cow<'_, str>) -> Result<Cow<'_, str>, Md2PdfError> {
    if text.trim().is_empty() {
        Err(Md2PdfError::EmptyInput)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_missing() {
        assert!(matches!(normalize_bytes(None), Err(Md2PdfError::MissingInput)));
        assert!(matches!(normalize_text(None), Err(Md2PdfError::MissingInput)));
    }

    #[test]
    fn empty_and_whitespace_are_empty() {
        assert!(matches!(
            normalize_bytes(Some(b"")),
            Err(Md2PdfError::EmptyInput)
        ));
        assert!(matches!(
            normalize_text(Some(" \n\t\r\n ")),
            Err(Md2PdfError::EmptyInput)
        ));
    }

    #[test]
    fn valid_text_is_borrowed_unchanged() {
        let out = normalize_text(Some("# Title\n")).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "# Title\n");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let out = normalize_bytes(Some(b"ok \xff\xfe done")).unwrap();
        assert!(out.starts_with("ok "));
        assert!(out.contains('\u{FFFD}'));
        assert!(out.ends_with(" done"));
    }

    #[test]
    fn invalid_bytes_that_decode_to_text_are_not_empty() {
        // A lone bad byte decodes to U+FFFD, which is not whitespace.
        assert!(normalize_bytes(Some(b"\x80")).is_ok());
    }
}
