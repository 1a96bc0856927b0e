//! The closed wire tag enumeration.
//!
//! The discriminant values are the binary contract: they appear verbatim
//! in the stream and decoders on the far side must match them. New tags
//! may be appended but existing values never change.

/// Byte length of a [`Tag::Unit`] block.
pub const UNIT_LEN: usize = 8;

/// Wire type tag for one value in a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::FromRepr, strum::IntoStaticStr)]
#[repr(u8)]
#[non_exhaustive]
pub enum Tag {
    /// No payload.
    Nil = 0,
    /// Unsigned 8-bit scalar.
    U8 = 1,
    /// Signed 8-bit scalar.
    I8 = 2,
    /// Boolean, one byte, zero is false.
    Bool = 3,
    /// Unsigned 16-bit scalar, little-endian.
    U16 = 4,
    /// Signed 16-bit scalar, little-endian.
    I16 = 5,
    /// Unsigned 32-bit scalar, little-endian.
    U32 = 6,
    /// Signed 32-bit scalar, little-endian.
    I32 = 7,
    /// IEEE-754 single float, little-endian.
    F32 = 8,
    /// Timestamp in whole seconds, unsigned 32-bit.
    TimeS = 9,
    /// Unsigned 64-bit scalar, little-endian.
    U64 = 10,
    /// Signed 64-bit scalar, little-endian.
    I64 = 11,
    /// IEEE-754 double float, little-endian.
    F64 = 12,
    /// Timestamp in microseconds, signed 64-bit.
    TimeUs = 13,
    /// Unsigned varint from a 16-bit source, at most 3 bytes.
    Uv16 = 14,
    /// Zig-zag signed varint from a 16-bit source, at most 3 bytes.
    Sv16 = 15,
    /// Unsigned varint from a 32-bit source, at most 5 bytes.
    Uv32 = 16,
    /// Zig-zag signed varint from a 32-bit source, at most 5 bytes.
    Sv32 = 17,
    /// Unsigned varint from a 64-bit source, at most 9 bytes.
    Uv64 = 18,
    /// Zig-zag signed varint from a 64-bit source, at most 9 bytes.
    Sv64 = 19,
    /// UTF-8 string; the NUL terminator is copied into the stream.
    Str = 20,
    /// UTF-8 label; bytes only, no terminator.
    Lbl = 21,
    /// Raw byte block with an explicit length.
    Blob = 22,
    /// Fixed [`UNIT_LEN`]-byte block.
    Unit = 23,
}

impl Tag {
    /// Payload length of a fixed-width tag, `None` for variable widths.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Tag::Nil => Some(0),
            Tag::U8 | Tag::I8 | Tag::Bool => Some(1),
            Tag::U16 | Tag::I16 => Some(2),
            Tag::U32 | Tag::I32 | Tag::F32 | Tag::TimeS => Some(4),
            Tag::U64 | Tag::I64 | Tag::F64 | Tag::TimeUs => Some(8),
            Tag::Unit => Some(UNIT_LEN),
            _ => None,
        }
    }

    /// True for tags whose descriptor carries an explicit byte length.
    pub fn has_explicit_len(self) -> bool {
        matches!(self, Tag::Str | Tag::Lbl | Tag::Blob)
    }

    /// The tag's wire name.
    pub fn name(self) -> &'static str {
        self.into()
    }
}
