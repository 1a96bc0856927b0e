//! The ring-buffer stream codec.
//!
//! A [`Stream`] borrows one caller-owned byte buffer and splits it into a
//! little-endian header and a ring of payload bytes. The header is the
//! whole of the stream's state, so a buffer can be handed between owners
//! (or persisted) and reopened with [`Stream::open`].
//!
//! Buffer layout:
//!
//! ```text
//! offset  field   width
//! 0       size    u32    ring payload length (buffer length - 20)
//! 4       start   u32    oldest unread byte
//! 8       stop    u32    write cursor, one past the newest byte
//! 12      read    u32    peek cursor, between start and stop
//! 16      state   u8     Writing or Locked
//! 17      -       [u8;3] reserved, zero
//! 20      ring    [u8]   frame bytes, wrapping
//! ```
//!
//! One ring byte always stays open so `start == stop` is unambiguously
//! empty. Frames are written back to back:
//!
//! ```text
//! [count u8] [tag u8 (+ Uv32 len for Str/Lbl/Blob)]* [payload]*
//! ```
//!
//! Every frame byte is folded into a 16-bit hash which [`Stream::write`]
//! returns and the read path recomputes, so both ends of a transport can
//! compare checksums without the hash occupying ring space.

use core::fmt;

use bytefold::{fold16, ring_distance, ring_space};

use crate::err::Error;
use crate::tag::{Tag, UNIT_LEN};
use crate::value::{Datum, Value};
use crate::varint;

/// Bytes of stream state ahead of the ring.
pub const HEADER_LEN: usize = 20;

const OFF_SIZE: usize = 0;
const OFF_START: usize = 4;
const OFF_STOP: usize = 8;
const OFF_READ: usize = 12;
const OFF_STATE: usize = 16;

/// Whether the stream accepts writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::FromRepr)]
#[repr(u8)]
pub enum State {
    /// Writes are accepted.
    Writing = 0,
    /// A reader holds the stream; writes fail with [`Error::Locked`].
    Locked = 1,
}

fn get32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn put32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// A typed frame codec over a borrowed ring buffer.
pub struct Stream<'a> {
    buf: &'a mut [u8],
}

impl<'a> Stream<'a> {
    /// Format `buf` as an empty stream and take ownership of it.
    ///
    /// The buffer must hold the header plus at least two ring bytes.
    pub fn create(buf: &'a mut [u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_LEN + 2 {
            return Err(Error::TooSmall);
        }
        let size = buf.len() - HEADER_LEN;
        if size > u32::MAX as usize {
            return Err(Error::TooSmall);
        }
        buf[..HEADER_LEN].fill(0);
        put32(buf, OFF_SIZE, size as u32);
        Ok(Stream { buf })
    }

    /// Adopt a buffer that already carries a stream, validating its header.
    pub fn open(buf: &'a mut [u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_LEN + 2 {
            return Err(Error::TooSmall);
        }
        let size = get32(buf, OFF_SIZE) as usize;
        if size != buf.len() - HEADER_LEN {
            return Err(Error::InvalidHeader("size field disagrees with buffer"));
        }
        let start = get32(buf, OFF_START) as usize;
        let stop = get32(buf, OFF_STOP) as usize;
        let read = get32(buf, OFF_READ) as usize;
        if start >= size || stop >= size || read >= size {
            return Err(Error::InvalidHeader("cursor outside the ring"));
        }
        if ring_distance(start, read, size) > ring_distance(start, stop, size) {
            return Err(Error::InvalidHeader("read cursor past the write cursor"));
        }
        if State::from_repr(buf[OFF_STATE]).is_none() {
            return Err(Error::InvalidHeader("unknown state byte"));
        }
        Ok(Stream { buf })
    }

    fn size(&self) -> usize {
        get32(self.buf, OFF_SIZE) as usize
    }

    fn start(&self) -> usize {
        get32(self.buf, OFF_START) as usize
    }

    fn stop(&self) -> usize {
        get32(self.buf, OFF_STOP) as usize
    }

    fn read_cursor(&self) -> usize {
        get32(self.buf, OFF_READ) as usize
    }

    /// Ring payload capacity in bytes. One byte of it always stays open.
    pub fn capacity(&self) -> usize {
        self.size()
    }

    /// Bytes of encoded frames waiting between `start` and `stop`.
    pub fn buffered(&self) -> usize {
        ring_distance(self.start(), self.stop(), self.size())
    }

    /// Bytes a write may still consume before overrunning unread data.
    pub fn space(&self) -> usize {
        ring_space(self.start(), self.stop(), self.size())
    }

    /// Current stream state.
    pub fn state(&self) -> State {
        State::from_repr(self.buf[OFF_STATE]).expect("state validated on create/open")
    }

    /// True when a reader holds the stream.
    pub fn is_locked(&self) -> bool {
        self.state() == State::Locked
    }

    /// Refuse writes until [`Stream::unlock`].
    pub fn lock(&mut self) {
        self.buf[OFF_STATE] = State::Locked as u8;
    }

    /// Accept writes again.
    pub fn unlock(&mut self) {
        self.buf[OFF_STATE] = State::Writing as u8;
    }

    /// The raw buffer, header included.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf
    }

    /// Encode `values` as one frame and return its fold hash.
    ///
    /// Either the whole frame lands in the ring and `stop` advances past
    /// it, or the error leaves every header field and ring byte exactly
    /// as they were.
    pub fn write(&mut self, values: &[Value]) -> Result<u16, Error> {
        if self.is_locked() {
            return Err(Error::Locked);
        }
        if values.len() > u8::MAX as usize {
            return Err(Error::FrameTooLarge);
        }
        let size = self.size();
        let start = self.start();
        let stop = self.stop();
        let space = ring_space(start, stop, size);

        // Walk the frame in wire order and fail before any byte moves.
        // `param` 0 is the count byte, value `i` is param `i + 1`.
        let halt = (stop + space) % size;
        let mut needed = 1usize;
        if needed > space {
            return Err(Error::BufferOverflow {
                param: 0,
                offset: halt,
            });
        }
        for (i, value) in values.iter().enumerate() {
            needed += descriptor_len(value)?;
            if needed > space {
                return Err(Error::BufferOverflow {
                    param: i + 1,
                    offset: halt,
                });
            }
        }
        for (i, value) in values.iter().enumerate() {
            needed += payload_len(value);
            if needed > space {
                return Err(Error::BufferOverflow {
                    param: i + 1,
                    offset: halt,
                });
            }
        }

        let (header, ring) = self.buf.split_at_mut(HEADER_LEN);
        let mut cur = WriteCursor {
            ring,
            stop,
            hash: 0,
        };
        cur.put(values.len() as u8);
        for value in values {
            cur.put(value.tag() as u8);
            if let Some(len) = explicit_len(value) {
                cur.put_varint(len as u64, varint::MAX32);
            }
        }
        for value in values {
            cur.put_value(value);
        }

        put32(header, OFF_STOP, cur.stop as u32);
        Ok(cur.hash)
    }

    /// Decode and consume the oldest frame, returning its values and the
    /// recomputed fold hash.
    ///
    /// Advances both `start` and the peek cursor past the frame.
    pub fn read_frame(&mut self) -> Result<(Vec<Datum>, u16), Error> {
        let start = self.start();
        let (data, next, hash) = self.parse_frame(start)?;
        put32(self.buf, OFF_START, next as u32);
        put32(self.buf, OFF_READ, next as u32);
        Ok((data, hash))
    }

    /// Decode the frame under the peek cursor without consuming it.
    ///
    /// Advances only the peek cursor; the frame's bytes stay buffered
    /// until [`Stream::read_frame`] passes them.
    pub fn peek_frame(&mut self) -> Result<(Vec<Datum>, u16), Error> {
        let read = self.read_cursor();
        let (data, next, hash) = self.parse_frame(read)?;
        put32(self.buf, OFF_READ, next as u32);
        Ok((data, hash))
    }

    /// Rewind the peek cursor back to the oldest unread frame.
    pub fn rewind(&mut self) {
        let start = self.start();
        put32(self.buf, OFF_READ, start as u32);
    }

    fn parse_frame(&self, from: usize) -> Result<(Vec<Datum>, usize, u16), Error> {
        let size = self.size();
        let stop = self.stop();
        let ring = &self.buf[HEADER_LEN..];
        let mut cur = ReadCursor {
            ring,
            at: from,
            avail: ring_distance(from, stop, size),
            hash: 0,
        };

        let count = cur.take()? as usize;
        let mut shapes = Vec::with_capacity(count);
        for _ in 0..count {
            let byte = cur.take()?;
            let tag = Tag::from_repr(byte).ok_or(Error::InvalidType(byte))?;
            let len = if tag.has_explicit_len() {
                let raw = cur.take_varint(varint::MAX32)?;
                if raw > u32::MAX as u64 {
                    return Err(Error::InvalidData("length exceeds 32-bit width"));
                }
                raw as usize
            } else {
                0
            };
            shapes.push((tag, len));
        }

        let mut data = Vec::with_capacity(count);
        for (tag, len) in shapes {
            data.push(cur.take_value(tag, len)?);
        }
        Ok((data, cur.at, cur.hash))
    }
}

impl fmt::Display for Stream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ringcode size={} start={} stop={} read={} state={:?} buffered={}",
            self.size(),
            self.start(),
            self.stop(),
            self.read_cursor(),
            self.state(),
            self.buffered(),
        )
    }
}

/// Explicit byte length carried in the descriptor, `None` for other tags.
fn explicit_len(value: &Value) -> Option<usize> {
    match value {
        Value::Str(s) | Value::Lbl(s) => Some(s.len()),
        Value::Blob(b) => Some(b.len()),
        _ => None,
    }
}

/// Descriptor bytes for one value: the tag, plus a length varint for the
/// variable-width tags.
fn descriptor_len(value: &Value) -> Result<usize, Error> {
    match explicit_len(value) {
        None => Ok(1),
        Some(len) => {
            if len > u32::MAX as usize {
                return Err(Error::FrameTooLarge);
            }
            Ok(1 + varint::encoded_len(len as u64, varint::MAX32))
        }
    }
}

/// Payload bytes one value will occupy in the ring.
fn payload_len(value: &Value) -> usize {
    if let Some(fixed) = value.tag().fixed_len() {
        return fixed;
    }
    match *value {
        Value::Uv16(v) => varint::encoded_len(u64::from(v), varint::MAX16),
        Value::Sv16(v) => varint::encoded_len(u64::from(varint::zigzag16(v)), varint::MAX16),
        Value::Uv32(v) => varint::encoded_len(u64::from(v), varint::MAX32),
        Value::Sv32(v) => varint::encoded_len(u64::from(varint::zigzag32(v)), varint::MAX32),
        Value::Uv64(v) => varint::encoded_len(v, varint::MAX64),
        Value::Sv64(v) => varint::encoded_len(varint::zigzag64(v), varint::MAX64),
        Value::Str(s) => s.len() + 1,
        Value::Lbl(s) => s.len(),
        Value::Blob(b) => b.len(),
        _ => unreachable!("fixed-width tags handled above"),
    }
}

/// Writer over the ring's free region. The frame becomes visible only
/// when the caller copies `stop` back into the header, and the space
/// pre-check in [`Stream::write`] guarantees every put lands in free
/// bytes.
struct WriteCursor<'r> {
    ring: &'r mut [u8],
    stop: usize,
    hash: u16,
}

impl WriteCursor<'_> {
    fn put(&mut self, byte: u8) {
        self.ring[self.stop] = byte;
        self.hash = fold16(byte, self.hash);
        self.stop += 1;
        if self.stop == self.ring.len() {
            self.stop = 0;
        }
    }

    fn put_block(&mut self, bytes: &[u8]) {
        let tail = self.ring.len() - self.stop;
        let first = bytes.len().min(tail);
        self.ring[self.stop..self.stop + first].copy_from_slice(&bytes[..first]);
        self.ring[..bytes.len() - first].copy_from_slice(&bytes[first..]);
        for &byte in bytes {
            self.hash = fold16(byte, self.hash);
        }
        self.stop += bytes.len();
        if self.stop >= self.ring.len() {
            self.stop -= self.ring.len();
        }
    }

    fn put_varint(&mut self, value: u64, max_len: usize) {
        let mut scratch = varint::Scratch::new();
        varint::encode(value, max_len, &mut scratch);
        self.put_block(&scratch);
    }

    fn put_value(&mut self, value: &Value) {
        match *value {
            Value::Nil => {}
            Value::U8(v) => self.put(v),
            Value::I8(v) => self.put(v as u8),
            Value::Bool(v) => self.put(v as u8),
            Value::U16(v) => self.put_block(&v.to_le_bytes()),
            Value::I16(v) => self.put_block(&v.to_le_bytes()),
            Value::U32(v) => self.put_block(&v.to_le_bytes()),
            Value::I32(v) => self.put_block(&v.to_le_bytes()),
            Value::F32(v) => self.put_block(&v.to_le_bytes()),
            Value::TimeS(v) => self.put_block(&v.to_le_bytes()),
            Value::U64(v) => self.put_block(&v.to_le_bytes()),
            Value::I64(v) => self.put_block(&v.to_le_bytes()),
            Value::F64(v) => self.put_block(&v.to_le_bytes()),
            Value::TimeUs(v) => self.put_block(&v.to_le_bytes()),
            Value::Uv16(v) => self.put_varint(u64::from(v), varint::MAX16),
            Value::Sv16(v) => self.put_varint(u64::from(varint::zigzag16(v)), varint::MAX16),
            Value::Uv32(v) => self.put_varint(u64::from(v), varint::MAX32),
            Value::Sv32(v) => self.put_varint(u64::from(varint::zigzag32(v)), varint::MAX32),
            Value::Uv64(v) => self.put_varint(v, varint::MAX64),
            Value::Sv64(v) => self.put_varint(varint::zigzag64(v), varint::MAX64),
            Value::Str(s) => {
                self.put_block(s.as_bytes());
                self.put(0);
            }
            Value::Lbl(s) => self.put_block(s.as_bytes()),
            Value::Blob(b) => self.put_block(b),
            Value::Unit(u) => self.put_block(u),
        }
    }
}

/// Non-destructive reader over the ring between a cursor and `stop`.
struct ReadCursor<'r> {
    ring: &'r [u8],
    at: usize,
    avail: usize,
    hash: u16,
}

impl ReadCursor<'_> {
    fn take(&mut self) -> Result<u8, Error> {
        if self.avail == 0 {
            return Err(Error::BufferUnderflow);
        }
        let byte = self.ring[self.at];
        self.hash = fold16(byte, self.hash);
        self.avail -= 1;
        self.at += 1;
        if self.at == self.ring.len() {
            self.at = 0;
        }
        Ok(byte)
    }

    fn take_exact(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        if self.avail < len {
            return Err(Error::BufferUnderflow);
        }
        let mut out = Vec::with_capacity(len);
        let tail = self.ring.len() - self.at;
        let first = len.min(tail);
        out.extend_from_slice(&self.ring[self.at..self.at + first]);
        out.extend_from_slice(&self.ring[..len - first]);
        for &byte in &out {
            self.hash = fold16(byte, self.hash);
        }
        self.avail -= len;
        self.at += len;
        if self.at >= self.ring.len() {
            self.at -= self.ring.len();
        }
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        for slot in &mut out {
            *slot = self.take()?;
        }
        Ok(out)
    }

    fn take_varint(&mut self, max_len: usize) -> Result<u64, Error> {
        let mut next = || self.take();
        varint::decode(&mut next, max_len)
    }

    fn take_narrow_varint(&mut self, max_len: usize, limit: u64) -> Result<u64, Error> {
        let raw = self.take_varint(max_len)?;
        if raw > limit {
            return Err(Error::InvalidData("varint exceeds its declared width"));
        }
        Ok(raw)
    }

    fn take_string(&mut self, len: usize, terminated: bool) -> Result<String, Error> {
        let bytes = self.take_exact(len)?;
        if terminated && self.take()? != 0 {
            return Err(Error::InvalidData("string missing its NUL terminator"));
        }
        String::from_utf8(bytes).map_err(|_| Error::InvalidData("string is not UTF-8"))
    }

    fn take_value(&mut self, tag: Tag, len: usize) -> Result<Datum, Error> {
        Ok(match tag {
            Tag::Nil => Datum::Nil,
            Tag::U8 => Datum::U8(self.take()?),
            Tag::I8 => Datum::I8(self.take()? as i8),
            Tag::Bool => Datum::Bool(self.take()? != 0),
            Tag::U16 => Datum::U16(u16::from_le_bytes(self.take_array()?)),
            Tag::I16 => Datum::I16(i16::from_le_bytes(self.take_array()?)),
            Tag::U32 => Datum::U32(u32::from_le_bytes(self.take_array()?)),
            Tag::I32 => Datum::I32(i32::from_le_bytes(self.take_array()?)),
            Tag::F32 => Datum::F32(f32::from_le_bytes(self.take_array()?)),
            Tag::TimeS => Datum::TimeS(u32::from_le_bytes(self.take_array()?)),
            Tag::U64 => Datum::U64(u64::from_le_bytes(self.take_array()?)),
            Tag::I64 => Datum::I64(i64::from_le_bytes(self.take_array()?)),
            Tag::F64 => Datum::F64(f64::from_le_bytes(self.take_array()?)),
            Tag::TimeUs => Datum::TimeUs(i64::from_le_bytes(self.take_array()?)),
            Tag::Uv16 => {
                let raw = self.take_narrow_varint(varint::MAX16, u64::from(u16::MAX))?;
                Datum::Uv16(raw as u16)
            }
            Tag::Sv16 => {
                let raw = self.take_narrow_varint(varint::MAX16, u64::from(u16::MAX))?;
                Datum::Sv16(varint::unzigzag16(raw as u16))
            }
            Tag::Uv32 => {
                let raw = self.take_narrow_varint(varint::MAX32, u64::from(u32::MAX))?;
                Datum::Uv32(raw as u32)
            }
            Tag::Sv32 => {
                let raw = self.take_narrow_varint(varint::MAX32, u64::from(u32::MAX))?;
                Datum::Sv32(varint::unzigzag32(raw as u32))
            }
            Tag::Uv64 => Datum::Uv64(self.take_varint(varint::MAX64)?),
            Tag::Sv64 => Datum::Sv64(varint::unzigzag64(self.take_varint(varint::MAX64)?)),
            Tag::Str => Datum::Str(self.take_string(len, true)?),
            Tag::Lbl => Datum::Lbl(self.take_string(len, false)?),
            Tag::Blob => Datum::Blob(self.take_exact(len)?),
            Tag::Unit => Datum::Unit(self.take_array::<UNIT_LEN>()?),
        })
    }
}
