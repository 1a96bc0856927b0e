//! Arena layout arithmetic.
//!
//! Every region offset is a pure function of the table's capacity, so a
//! reader holding nothing but the header can reconstruct the whole
//! structure. All multi-byte fields are little-endian and unaligned; the
//! arena may start at any address.
//!
//! ```text
//! [header 16B]
//! [sorted hashes      u16 * capacity]
//! [slot entries       u16 * capacity]   sorted slot -> insertion index
//! [collision heads    u16 * capacity]   NONE | offset into the pile
//! [collision pile     u16 * 2*capacity]
//! [key tails          u16 * capacity]   distance from arena end to key start
//! [data offsets       u16 * capacity]   distance from arena end to value start
//! [state bytes        u8  * capacity]   caller-supplied tag per entry
//! [ ... free gap ... ]
//! [key/value heap growing downward from the arena end]
//! ```

/// Sentinel index: "no entry" / "no collision" / chain terminator.
pub const NONE: u16 = u16::MAX;

/// Size of the arena header in bytes.
pub(crate) const HEADER_LEN: usize = 16;

/// Header field offsets. `size` is `u32`, the rest are `u16`.
pub(crate) const SIZE_OFF: usize = 0;
pub(crate) const CAPACITY_OFF: usize = 4;
pub(crate) const COUNT_OFF: usize = 6;
pub(crate) const HASH_COUNT_OFF: usize = 8;
pub(crate) const PILE_LEN_OFF: usize = 10;

/// Largest supported capacity. Bounded so every pile offset fits in a
/// `u16` with room for the sentinel.
pub(crate) const MAX_CAPACITY: usize = 0x7FFF;

/// Largest supported arena, so every heap offset fits in a `u16`.
pub(crate) const MAX_ARENA: usize = u16::MAX as usize;

/// Collision pile capacity in `u16` slots.
///
/// A chain of length L consumes L + 1 slots (terminator included), and the
/// chain lengths sum to at most the entry count, so `2 * capacity` slots
/// can never be exhausted before the entries are.
#[inline]
pub(crate) fn pile_cap(capacity: usize) -> usize {
    2 * capacity
}

/// Byte offsets of each metadata region for a given capacity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Regions {
    pub hashes: usize,
    pub slots: usize,
    pub heads: usize,
    pub pile: usize,
    pub key_tails: usize,
    pub data_offs: usize,
    pub states: usize,
    /// First byte past the metadata; the heap gap begins here.
    pub meta_end: usize,
}

impl Regions {
    pub(crate) fn for_capacity(capacity: usize) -> Self {
        let hashes = HEADER_LEN;
        let slots = hashes + 2 * capacity;
        let heads = slots + 2 * capacity;
        let pile = heads + 2 * capacity;
        let key_tails = pile + 2 * pile_cap(capacity);
        let data_offs = key_tails + 2 * capacity;
        let states = data_offs + 2 * capacity;
        let meta_end = states + capacity;
        Self {
            hashes,
            slots,
            heads,
            pile,
            key_tails,
            data_offs,
            states,
            meta_end,
        }
    }
}

/// Read a little-endian `u16` at `offset`.
#[inline(always)]
pub(crate) fn get16(arena: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([arena[offset], arena[offset + 1]])
}

/// Write a little-endian `u16` at `offset`.
#[inline(always)]
pub(crate) fn put16(arena: &mut [u8], offset: usize, value: u16) {
    arena[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Read a little-endian `u32` at `offset`.
#[inline(always)]
pub(crate) fn get32(arena: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        arena[offset],
        arena[offset + 1],
        arena[offset + 2],
        arena[offset + 3],
    ])
}

/// Write a little-endian `u32` at `offset`.
#[inline(always)]
pub(crate) fn put32(arena: &mut [u8], offset: usize, value: u32) {
    arena[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Shift the `u16` elements `[from..len)` of the array at `base` one
/// element toward higher indices, opening a hole at `from`.
#[inline]
pub(crate) fn shift_right16(arena: &mut [u8], base: usize, from: usize, len: usize) {
    arena.copy_within(base + 2 * from..base + 2 * len, base + 2 * from + 2);
}

/// Shift the `u16` elements `[from..len)` of the array at `base` by
/// `step` elements toward lower indices, closing a hole.
#[inline]
pub(crate) fn shift_left16(arena: &mut [u8], base: usize, from: usize, len: usize, step: usize) {
    arena.copy_within(base + 2 * from..base + 2 * len, base + 2 * (from - step));
}
