//! Shared winnow-based parsing utilities used by the cursor and record codecs.

use winnow::error::ContextError;

use crate::error::{DlpError, DlpResult};

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Return the bytes of `field` before the first NUL, or all of them if there is none.
pub fn trim_at_nul(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Decode a NUL-terminated (or NUL-padded) byte field as text. Every byte is
/// one character (ISO-8859-1), so any name survives a decode/encode cycle.
pub fn decode_c_string(field: &[u8]) -> String {
    trim_at_nul(field).iter().copied().map(char::from).collect()
}

/// Inverse of [`decode_c_string`]: one byte per character. Characters above
/// U+00FF have no byte form.
pub fn encode_c_string(field: &'static str, value: &str) -> DlpResult<Vec<u8>> {
    value
        .chars()
        .map(|ch| u8::try_from(ch).map_err(|_| DlpError::UnencodableText { field, ch }))
        .collect()
}
