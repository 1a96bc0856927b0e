//! Byte buffer primitives shared by the arena table and the ring codec.
//!
//! Everything in this crate operates on plain integers and byte slices.
//! The fold hashes are multiplicative prime folds: each byte is multiplied
//! by a width-specific prime and added into the running state, wrapping on
//! overflow. The fold is cheap enough to run per byte on a streaming write
//! path and is used both as the table's key hash and as the codec's frame
//! integrity hash.

#![warn(missing_docs)]

use num_traits::{WrappingAdd, WrappingMul};

/// Largest prime that fits in 16 bits.
pub const PRIME16: u16 = 65_521;

/// Largest prime that fits in 32 bits.
pub const PRIME32: u32 = 4_294_967_291;

/// Largest prime that fits in 64 bits.
pub const PRIME64: u64 = 18_446_744_073_709_551_557;

/// Fold one byte into a running hash: `byte * prime + hash`, wrapping.
///
/// Generic over the hash width so the three public widths share one
/// definition. Note the fold is commutative over the byte values; it is a
/// distribution hash for short keys, not a cryptographic digest.
#[inline(always)]
fn fold<H>(byte: u8, hash: H, prime: H) -> H
where
    H: Copy + From<u8> + WrappingAdd + WrappingMul,
{
    H::from(byte).wrapping_mul(&prime).wrapping_add(&hash)
}

/// Fold one byte into a 16-bit running hash.
#[inline(always)]
pub fn fold16(byte: u8, hash: u16) -> u16 {
    fold(byte, hash, PRIME16)
}

/// Fold one byte into a 32-bit running hash.
#[inline(always)]
pub fn fold32(byte: u8, hash: u32) -> u32 {
    fold(byte, hash, PRIME32)
}

/// Fold one byte into a 64-bit running hash.
#[inline(always)]
pub fn fold64(byte: u8, hash: u64) -> u64 {
    fold(byte, hash, PRIME64)
}

/// 16-bit fold hash of a byte slice, starting from zero.
#[inline]
pub fn hash16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |hash, &byte| fold16(byte, hash))
}

/// 32-bit fold hash of a byte slice, starting from zero.
#[inline]
pub fn hash32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |hash, &byte| fold32(byte, hash))
}

/// 64-bit fold hash of a byte slice, starting from zero.
#[inline]
pub fn hash64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0, |hash, &byte| fold64(byte, hash))
}

/// Round `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline(always)]
pub fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Number of readable bytes between two ring cursors.
///
/// Both cursors must be below `size`. A ring where `start == stop` is
/// empty, never full; see [`ring_space`].
#[inline(always)]
pub fn ring_distance(start: usize, stop: usize, size: usize) -> usize {
    debug_assert!(start < size && stop < size);
    if stop >= start {
        stop - start
    } else {
        size - start + stop
    }
}

/// Number of writable bytes left in a ring of `size` bytes.
///
/// One byte is always held in reserve so that a full ring and an empty
/// ring have distinct cursor states.
#[inline(always)]
pub fn ring_space(start: usize, stop: usize, size: usize) -> usize {
    size - ring_distance(start, stop, size) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold16_matches_scalar_definition() {
        // One byte: b * 65521 mod 2^16.
        assert_eq!(hash16(b"a"), (97u32 * 65_521 % 65_536) as u16);
        assert_eq!(hash16(b""), 0);
    }

    #[test]
    fn fold16_accumulates() {
        let mut hash = 0;
        for &byte in b"key-name" {
            hash = fold16(byte, hash);
        }
        assert_eq!(hash, hash16(b"key-name"));
    }

    #[test]
    fn wider_folds_disagree_with_narrow_ones() {
        // Sanity check that each width actually uses its own prime.
        let bytes = b"0123456789abcdef";
        assert_ne!(u64::from(hash16(bytes)), hash64(bytes) & 0xFFFF);
        assert_ne!(u64::from(hash32(bytes)), hash64(bytes) & 0xFFFF_FFFF);
    }

    #[test]
    fn align_up_rounds_to_powers_of_two() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn ring_arithmetic() {
        assert_eq!(ring_distance(0, 0, 64), 0);
        assert_eq!(ring_distance(10, 20, 64), 10);
        assert_eq!(ring_distance(60, 4, 64), 8);
        assert_eq!(ring_space(0, 0, 64), 63);
        assert_eq!(ring_space(5, 4, 64), 0);
    }
}
