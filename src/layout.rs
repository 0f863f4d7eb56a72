//! Bit layout of a tag GID.
//!
//! A GID packs a whole tag path into one `u128`: the level of the deepest
//! segment in the top 3 bits, then one hash slot per level. Ancestors share
//! every slot above their own level with their descendants, so prefix checks
//! are a single masked compare.
//!
//! ```text
//! ┌─────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ Level   │ Slot 0   │ Slot 1   │ Slot 2   │ Slot 3   │ Slot 4   │ Slot 5   │ Slot 6   │ Slot 7   │
//! │ 3 bits  │ 21 bits  │ 18 bits  │ 16 bits  │ 16 bits  │ 14 bits  │ 14 bits  │ 13 bits  │ 13 bits  │
//! │[127:125]│[124:104] │ [103:86] │ [85:70]  │ [69:54]  │ [53:40]  │ [39:26]  │ [25:13]  │ [12:0]   │
//! └─────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Slot hashes are never zero, so GID `0` is free to act as the empty tag.

use crate::GID;

/// Deepest supported tag, in segments.
pub const MAX_DEPTH: usize = 8;

/// Bits reserved for the level field.
pub const LEVEL_BITS: u8 = 3;

/// First bit of the level field.
pub const LEVEL_SHIFT: u8 = 128 - LEVEL_BITS;

/// Mask selecting the level field.
pub const LEVEL_FIELD: u128 = 0b111 << LEVEL_SHIFT;

/// GID of the empty tag.
pub const EMPTY_GID: GID = 0;

/// Hash slot width per level. Shallow levels get wider slots because they hold
/// the broadest categories and see the most siblings.
pub const SLOT_WIDTHS: [u8; MAX_DEPTH] = [21, 18, 16, 16, 14, 14, 13, 13];

/// Lowest bit of each slot.
pub const SLOT_OFFSETS: [u8; MAX_DEPTH] = {
    let mut offsets = [0u8; MAX_DEPTH];
    let mut top = LEVEL_SHIFT;
    let mut i = 0;
    while i < MAX_DEPTH {
        top -= SLOT_WIDTHS[i];
        offsets[i] = top;
        i += 1;
    }
    offsets
};

/// `PREFIX_MASKS[l]` covers slots `0..=l` (level field excluded).
pub const PREFIX_MASKS: [u128; MAX_DEPTH] = {
    let mut masks = [0u128; MAX_DEPTH];
    let mut acc = 0u128;
    let mut i = 0;
    while i < MAX_DEPTH {
        acc |= ((1u128 << SLOT_WIDTHS[i]) - 1) << SLOT_OFFSETS[i];
        masks[i] = acc;
        i += 1;
    }
    masks
};

const _: () = {
    let mut total: u16 = LEVEL_BITS as u16;
    let mut i = 0;
    while i < MAX_DEPTH {
        total += SLOT_WIDTHS[i] as u16;
        i += 1;
    }
    assert!(total == 128, "slots plus level field must fill 128 bits");
    assert!(SLOT_OFFSETS[MAX_DEPTH - 1] == 0, "last slot must end at bit 0");
};

/// Level (0-based) of the deepest segment encoded in `gid`.
#[inline]
pub const fn level_of(gid: GID) -> u8 {
    ((gid & LEVEL_FIELD) >> LEVEL_SHIFT) as u8
}

/// Combine slot bits with a level field.
#[inline]
pub const fn encode_gid(slots: u128, level: u8) -> GID {
    debug_assert!((level as usize) < MAX_DEPTH, "level out of range");
    debug_assert!(slots & LEVEL_FIELD == 0, "slots overlap the level field");
    slots | ((level as u128) << LEVEL_SHIFT)
}

/// Slot bits of `gid` with the level field stripped.
#[inline]
pub const fn slots_of(gid: GID) -> u128 {
    gid & !LEVEL_FIELD
}

/// Is `candidate` equal to `ancestor` or somewhere below it?
///
/// This only looks at hash slots, so it can report `true` for two unrelated
/// paths whose segments collide. Use it as a rejection filter and confirm on
/// the path text.
#[inline]
pub const fn gid_is_descendant_of(candidate: GID, ancestor: GID) -> bool {
    if ancestor == EMPTY_GID || candidate == EMPTY_GID {
        return false;
    }
    let level = level_of(ancestor);
    if level_of(candidate) < level {
        return false;
    }
    let mask = PREFIX_MASKS[level as usize];
    (candidate & mask) == (ancestor & mask)
}

/// GID of the ancestor at `level`, or `None` if `gid` is shallower than that.
#[inline]
pub const fn truncate_to(gid: GID, level: u8) -> Option<GID> {
    if gid == EMPTY_GID || level > level_of(gid) {
        return None;
    }
    Some(encode_gid(gid & PREFIX_MASKS[level as usize], level))
}

/// GID of the direct parent; `None` for top-level tags and the empty tag.
#[inline]
pub const fn parent_of(gid: GID) -> Option<GID> {
    let level = level_of(gid);
    if gid == EMPTY_GID || level == 0 {
        return None;
    }
    truncate_to(gid, level - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_slot(slots: u128, level: usize, value: u128) -> u128 {
        slots | (value << SLOT_OFFSETS[level])
    }

    #[test]
    fn slots_never_touch_level_field() {
        for level in 0..MAX_DEPTH {
            let slot = ((1u128 << SLOT_WIDTHS[level]) - 1) << SLOT_OFFSETS[level];
            assert_eq!(slot & LEVEL_FIELD, 0, "slot {} overlaps the level field", level);
        }
        assert_eq!(PREFIX_MASKS[MAX_DEPTH - 1], !LEVEL_FIELD);
    }

    #[test]
    fn level_round_trips() {
        for level in 0..MAX_DEPTH as u8 {
            let gid = encode_gid(with_slot(0, 0, 0x1234), level);
            assert_eq!(level_of(gid), level);
        }
    }

    #[test]
    fn descendant_check_is_inclusive_and_directional() {
        let top = encode_gid(with_slot(0, 0, 0x10), 0);
        let child = encode_gid(with_slot(slots_of(top), 1, 0x20), 1);
        let stranger = encode_gid(with_slot(0, 0, 0x11), 0);

        assert!(gid_is_descendant_of(child, top));
        assert!(gid_is_descendant_of(top, top));
        assert!(!gid_is_descendant_of(top, child));
        assert!(!gid_is_descendant_of(stranger, top));
    }

    #[test]
    fn empty_gid_relates_to_nothing() {
        let top = encode_gid(with_slot(0, 0, 0x10), 0);
        assert!(!gid_is_descendant_of(EMPTY_GID, top));
        assert!(!gid_is_descendant_of(top, EMPTY_GID));
        assert!(!gid_is_descendant_of(EMPTY_GID, EMPTY_GID));
        assert_eq!(parent_of(EMPTY_GID), None);
        assert_eq!(truncate_to(EMPTY_GID, 0), None);
    }

    #[test]
    fn parent_and_truncate_walk_up() {
        let a = with_slot(0, 0, 0x10);
        let ab = with_slot(a, 1, 0x20);
        let abc = with_slot(ab, 2, 0x30);
        let leaf = encode_gid(abc, 2);

        assert_eq!(parent_of(leaf), Some(encode_gid(ab, 1)));
        assert_eq!(truncate_to(leaf, 0), Some(encode_gid(a, 0)));
        assert_eq!(truncate_to(leaf, 2), Some(leaf));
        assert_eq!(truncate_to(leaf, 3), None);
        assert_eq!(parent_of(encode_gid(a, 0)), None);
    }
}
