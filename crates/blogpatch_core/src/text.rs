//! Character-offset helpers.
//!
//! Offsets on the wire count Unicode scalar values, not bytes. These helpers
//! translate between the two without panicking on out-of-range input.

/// Byte offset of the `n`-th character, or `s.len()` when `n` is exactly the
/// character length. `None` past the end.
pub fn byte_offset(s: &str, n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }
    let mut count = 0;
    for (byte, _) in s.char_indices() {
        if count == n {
            return Some(byte);
        }
        count += 1;
    }
    (count == n).then_some(s.len())
}

/// Slice `s` by character offsets `[start, end)`.
pub fn char_slice(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let from = byte_offset(s, start)?;
    let to = from + byte_offset(&s[from..], end - start)?;
    Some(&s[from..to])
}

/// Split `s` at a character offset.
pub fn split_at_char(s: &str, n: usize) -> Option<(&str, &str)> {
    byte_offset(s, n).map(|at| s.split_at(at))
}
