//! Client-side payload masking.
//!
//! Masking keys come from one process-wide counter shared by every client
//! encoder. The keys are predictable, not random: interop tests replay exact
//! byte sequences, so the counter behavior is kept as is.

use std::sync::atomic::{AtomicU32, Ordering};

static MASK_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Returns the next masking key, the incremented counter in big-endian order.
pub fn next_mask_key() -> [u8; 4] {
    MASK_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1).to_be_bytes()
}

/// XORs `data` in place with `key`, cycling through its four bytes.
///
/// Applying the same key twice restores the original bytes.
#[inline]
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}
