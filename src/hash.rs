//! Case-folded hashing of tag paths into GIDs.
//!
//! Segments are hashed with FNV-1a over their ASCII-lowercased bytes, so
//! `State.Combat` and `state.COMBAT` land on the same GID.

use crate::GID;
use crate::layout::{MAX_DEPTH, SLOT_OFFSETS, SLOT_WIDTHS, encode_gid};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit over the ASCII-lowercased input.
pub const fn folded_fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i].to_ascii_lowercase() as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Hash one segment into a `width`-bit slot value. Never returns 0.
#[inline]
pub const fn segment_hash(segment: &[u8], width: u8) -> u128 {
    debug_assert!(width > 0 && width <= 64, "width must be in 1..=64");
    let full = folded_fnv1a_64(segment);
    let mixed = full ^ (full >> 32) ^ (full >> 17);
    let value = (mixed as u128) & ((1u128 << width) - 1);
    if value == 0 { 1 } else { value }
}

/// GID for a sequence of already-trimmed segments.
///
/// Only the first [`MAX_DEPTH`] segments are encoded; deeper ones leave the
/// GID unchanged. Returns `None` for an empty sequence.
pub fn path_gid<'a, I>(segments: I) -> Option<GID>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut slots = 0u128;
    let mut count = 0usize;
    for segment in segments.into_iter().take(MAX_DEPTH) {
        slots |= segment_hash(segment.as_bytes(), SLOT_WIDTHS[count]) << SLOT_OFFSETS[count];
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(encode_gid(slots, (count - 1) as u8))
}
