//! Decimal field parsing for text replies.
//!
//! Replies such as `+SOCKETREAD:<id>,<len>,<data>` carry several numbers in
//! one buffer. [`parse_u32`] returns where the digits ended so the caller
//! can keep scanning from there.

use platform::{Error, Result};

/// Parse an unsigned decimal number at the start of `text`.
///
/// Leading spaces and tabs are skipped. Returns the value and the index of
/// the first byte after its digits.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if no digit follows the optional whitespace;
/// [`Error::Overflow`] if the value does not fit in a `u32`.
pub fn parse_u32(text: &[u8]) -> Result<(u32, usize)> {
    let start = text
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t'))
        .unwrap_or(text.len());
    let digits = text
        .iter()
        .skip(start)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return Err(Error::InvalidArgument);
    }

    let mut value: u32 = 0;
    for &b in text.iter().skip(start).take(digits) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u32::from(b.wrapping_sub(b'0'))))
            .ok_or(Error::Overflow)?;
    }
    // start + digits <= text.len()
    Ok((value, start.saturating_add(digits)))
}

/// Find the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
