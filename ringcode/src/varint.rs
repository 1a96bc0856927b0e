//! Width-bounded base-128 varints.
//!
//! Seven payload bits per byte, continuation flag in the high bit,
//! little-endian group order. The encoded size is bounded by the source
//! width: the final permitted byte of each width carries its bits raw,
//! with no continuation flag, so a 64-bit value never needs a tenth byte.
//! Signed variants zig-zag before encoding so small magnitudes stay
//! small.

use arrayvec::ArrayVec;

use crate::err::Error;

/// Maximum encoded bytes for a 16-bit source.
pub(crate) const MAX16: usize = 3;
/// Maximum encoded bytes for a 32-bit source.
pub(crate) const MAX32: usize = 5;
/// Maximum encoded bytes for a 64-bit source.
pub(crate) const MAX64: usize = 9;

/// Scratch space sized for the widest varint.
pub(crate) type Scratch = ArrayVec<u8, MAX64>;

/// Encode `value` into `out` using at most `max_len` bytes.
///
/// `value` must already fit the width implied by `max_len`.
pub(crate) fn encode(mut value: u64, max_len: usize, out: &mut Scratch) {
    loop {
        if out.len() == max_len - 1 {
            // Last permitted byte: raw bits, no continuation flag.
            out.push(value as u8);
            return;
        }
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Bytes [`encode`] will emit for `value` under a `max_len` bound.
pub(crate) fn encoded_len(value: u64, max_len: usize) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    let groups = bits.div_ceil(7).max(1);
    groups.min(max_len)
}

/// Decode a varint of at most `max_len` bytes, pulling bytes from `next`.
pub(crate) fn decode(
    next: &mut impl FnMut() -> Result<u8, Error>,
    max_len: usize,
) -> Result<u64, Error> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut index = 0usize;
    loop {
        let byte = next()?;
        if index == max_len - 1 {
            return Ok(value | (u64::from(byte) << shift));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        index += 1;
    }
}

/// Zig-zag a signed 16-bit value into the unsigned domain.
pub(crate) fn zigzag16(value: i16) -> u16 {
    ((value as u16) << 1) ^ ((value >> 15) as u16)
}

/// Invert [`zigzag16`].
pub(crate) fn unzigzag16(value: u16) -> i16 {
    ((value >> 1) as i16) ^ -((value & 1) as i16)
}

/// Zig-zag a signed 32-bit value into the unsigned domain.
pub(crate) fn zigzag32(value: i32) -> u32 {
    ((value as u32) << 1) ^ ((value >> 31) as u32)
}

/// Invert [`zigzag32`].
pub(crate) fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag a signed 64-bit value into the unsigned domain.
pub(crate) fn zigzag64(value: i64) -> u64 {
    ((value as u64) << 1) ^ ((value >> 63) as u64)
}

/// Invert [`zigzag64`].
pub(crate) fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: u64, max_len: usize) -> (usize, u64) {
        let mut out = Scratch::new();
        encode(value, max_len, &mut out);
        assert_eq!(out.len(), encoded_len(value, max_len));
        let mut bytes = out.iter().copied();
        let mut next = || bytes.next().ok_or(Error::BufferUnderflow);
        let decoded = decode(&mut next, max_len).expect("decodes");
        (out.len(), decoded)
    }

    #[test]
    fn documented_byte_counts() {
        assert_eq!(round_trip(0, MAX32), (1, 0));
        assert_eq!(round_trip(127, MAX32), (1, 127));
        assert_eq!(round_trip(128, MAX32), (2, 128));
        assert_eq!(round_trip(16_383, MAX32), (2, 16_383));
        assert_eq!(round_trip((1 << 31) - 1, MAX32), (5, (1 << 31) - 1));
        assert_eq!(round_trip(1 << 31, MAX32), (5, 1 << 31));
        assert_eq!(round_trip(u32::MAX as u64, MAX32), (5, u32::MAX as u64));
    }

    #[test]
    fn width_bounds_hold_at_the_extremes() {
        assert_eq!(round_trip(u16::MAX as u64, MAX16), (3, u16::MAX as u64));
        assert_eq!(round_trip(u64::MAX, MAX64), (9, u64::MAX));
        // Values above 2^56 exercise the raw ninth byte.
        let top = 0xFEDC_BA98_7654_3210;
        assert_eq!(round_trip(top, MAX64), (9, top));
    }

    #[test]
    fn zigzag_round_trips() {
        for value in [0i16, -1, 1, i16::MIN, i16::MAX, -64, 63] {
            assert_eq!(unzigzag16(zigzag16(value)), value);
        }
        assert_eq!(zigzag16(0), 0);
        assert_eq!(zigzag16(-1), 1);
        assert_eq!(zigzag16(1), 2);
        for value in [0i64, -1, i64::MIN, i64::MAX] {
            assert_eq!(unzigzag64(zigzag64(value)), value);
        }
        for value in [0i32, -1, i32::MIN, i32::MAX] {
            assert_eq!(unzigzag32(zigzag32(value)), value);
        }
    }
}
