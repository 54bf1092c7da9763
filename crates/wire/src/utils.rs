//! Utility macros and helpers shared by the codecs.

/// Early-returns `Err($error)` when `$predicate` does not hold.
///
/// ```ignore
/// ensure!(len <= max, ParseError::too_large_body(len, max));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Returns the position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Removes `start..end` from `buf` in place, shifting the tail down.
pub(crate) fn erase(buf: &mut bytes::BytesMut, start: usize, end: usize) {
    let len = buf.len();
    buf.copy_within(end..len, start);
    buf.truncate(len - (end - start));
}
