//! Borrowed and owned forms of a stream element.

use crate::tag::{Tag, UNIT_LEN};

/// A borrowed element staged for writing into a stream frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    /// No payload.
    Nil,
    /// Unsigned byte.
    U8(u8),
    /// Signed byte.
    I8(i8),
    /// Boolean, one byte on the wire.
    Bool(bool),
    /// Unsigned 16-bit, fixed width.
    U16(u16),
    /// Signed 16-bit, fixed width.
    I16(i16),
    /// Unsigned 32-bit, fixed width.
    U32(u32),
    /// Signed 32-bit, fixed width.
    I32(i32),
    /// IEEE-754 single.
    F32(f32),
    /// Seconds timestamp, 32-bit.
    TimeS(u32),
    /// Unsigned 64-bit, fixed width.
    U64(u64),
    /// Signed 64-bit, fixed width.
    I64(i64),
    /// IEEE-754 double.
    F64(f64),
    /// Microseconds timestamp, 64-bit.
    TimeUs(i64),
    /// Unsigned 16-bit, varint encoded.
    Uv16(u16),
    /// Signed 16-bit, zig-zag varint encoded.
    Sv16(i16),
    /// Unsigned 32-bit, varint encoded.
    Uv32(u32),
    /// Signed 32-bit, zig-zag varint encoded.
    Sv32(i32),
    /// Unsigned 64-bit, varint encoded.
    Uv64(u64),
    /// Signed 64-bit, zig-zag varint encoded.
    Sv64(i64),
    /// UTF-8 text, NUL terminated on the wire.
    Str(&'a str),
    /// UTF-8 label, same wire shape as [`Value::Str`].
    Lbl(&'a str),
    /// Raw bytes with an explicit length.
    Blob(&'a [u8]),
    /// Fixed eight-byte unit.
    Unit(&'a [u8; UNIT_LEN]),
}

impl Value<'_> {
    /// Wire tag for this element.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Nil => Tag::Nil,
            Value::U8(_) => Tag::U8,
            Value::I8(_) => Tag::I8,
            Value::Bool(_) => Tag::Bool,
            Value::U16(_) => Tag::U16,
            Value::I16(_) => Tag::I16,
            Value::U32(_) => Tag::U32,
            Value::I32(_) => Tag::I32,
            Value::F32(_) => Tag::F32,
            Value::TimeS(_) => Tag::TimeS,
            Value::U64(_) => Tag::U64,
            Value::I64(_) => Tag::I64,
            Value::F64(_) => Tag::F64,
            Value::TimeUs(_) => Tag::TimeUs,
            Value::Uv16(_) => Tag::Uv16,
            Value::Sv16(_) => Tag::Sv16,
            Value::Uv32(_) => Tag::Uv32,
            Value::Sv32(_) => Tag::Sv32,
            Value::Uv64(_) => Tag::Uv64,
            Value::Sv64(_) => Tag::Sv64,
            Value::Str(_) => Tag::Str,
            Value::Lbl(_) => Tag::Lbl,
            Value::Blob(_) => Tag::Blob,
            Value::Unit(_) => Tag::Unit,
        }
    }
}

/// An owned element decoded out of a stream frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    /// No payload.
    Nil,
    /// Unsigned byte.
    U8(u8),
    /// Signed byte.
    I8(i8),
    /// Boolean.
    Bool(bool),
    /// Unsigned 16-bit.
    U16(u16),
    /// Signed 16-bit.
    I16(i16),
    /// Unsigned 32-bit.
    U32(u32),
    /// Signed 32-bit.
    I32(i32),
    /// IEEE-754 single.
    F32(f32),
    /// Seconds timestamp.
    TimeS(u32),
    /// Unsigned 64-bit.
    U64(u64),
    /// Signed 64-bit.
    I64(i64),
    /// IEEE-754 double.
    F64(f64),
    /// Microseconds timestamp.
    TimeUs(i64),
    /// Unsigned 16-bit, was varint on the wire.
    Uv16(u16),
    /// Signed 16-bit, was varint on the wire.
    Sv16(i16),
    /// Unsigned 32-bit, was varint on the wire.
    Uv32(u32),
    /// Signed 32-bit, was varint on the wire.
    Sv32(i32),
    /// Unsigned 64-bit, was varint on the wire.
    Uv64(u64),
    /// Signed 64-bit, was varint on the wire.
    Sv64(i64),
    /// UTF-8 text.
    Str(String),
    /// UTF-8 label.
    Lbl(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Fixed eight-byte unit.
    Unit([u8; UNIT_LEN]),
}

impl Datum {
    /// Wire tag for this element.
    pub fn tag(&self) -> Tag {
        match self {
            Datum::Nil => Tag::Nil,
            Datum::U8(_) => Tag::U8,
            Datum::I8(_) => Tag::I8,
            Datum::Bool(_) => Tag::Bool,
            Datum::U16(_) => Tag::U16,
            Datum::I16(_) => Tag::I16,
            Datum::U32(_) => Tag::U32,
            Datum::I32(_) => Tag::I32,
            Datum::F32(_) => Tag::F32,
            Datum::TimeS(_) => Tag::TimeS,
            Datum::U64(_) => Tag::U64,
            Datum::I64(_) => Tag::I64,
            Datum::F64(_) => Tag::F64,
            Datum::TimeUs(_) => Tag::TimeUs,
            Datum::Uv16(_) => Tag::Uv16,
            Datum::Sv16(_) => Tag::Sv16,
            Datum::Uv32(_) => Tag::Uv32,
            Datum::Sv32(_) => Tag::Sv32,
            Datum::Uv64(_) => Tag::Uv64,
            Datum::Sv64(_) => Tag::Sv64,
            Datum::Str(_) => Tag::Str,
            Datum::Lbl(_) => Tag::Lbl,
            Datum::Blob(_) => Tag::Blob,
            Datum::Unit(_) => Tag::Unit,
        }
    }
}
