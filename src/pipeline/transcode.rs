//! Stage 2: restrict text to the 8-bit range the built-in fonts can encode.

use std::borrow::Cow;
use tracing::warn;

/// Highest code point kept by [`to_latin1`].
pub const MAX_CODE_POINT: char = '\u{FF}';

/// Drop every character above U+00FF.
///
/// Returns the kept text and the number of dropped characters. Input that is
/// already Latin-1 is returned borrowed, so repeated calls are free.
pub fn to_latin1(text: &str) -> (Cow<'_, str>, usize) {
    let dropped = text.chars().filter(|&c| c > MAX_CODE_POINT).count();
    if dropped == 0 {
        return (Cow::Borrowed(text), 0);
    }
    warn!(
        "Dropping {} character(s) outside the Latin-1 range",
        dropped
    );
    let kept: String = text.chars().filter(|&c| c <= MAX_CODE_POINT).collect();
    (Cow::Owned(kept), dropped)
}
