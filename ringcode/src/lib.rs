//! Typed, self-describing binary frames over a caller-owned ring buffer.
//!
//! A [`Stream`] formats one flat byte buffer into a 20-byte header plus a
//! wrapping ring of frames. Each frame opens with a count byte and a
//! descriptor per value (a [`Tag`] byte, plus a varint byte length for
//! the variable-width tags), followed by the payloads. The writer folds
//! every frame byte into a 16-bit hash and returns it; the read path
//! recomputes the same hash so both ends of a transport can compare.
//!
//! All stream state lives in the buffer itself, so a buffer can cross an
//! IPC boundary or a file and be picked back up with [`Stream::open`].
//!
//! ```
//! use ringcode::{Datum, Stream, Value};
//!
//! let mut buf = [0u8; 256];
//! let mut stream = Stream::create(&mut buf)?;
//!
//! let sent = stream.write(&[Value::U32(0xDEAD_BEEF), Value::Str("dock")])?;
//! let (frame, got) = stream.read_frame()?;
//!
//! assert_eq!(sent, got);
//! assert_eq!(frame[0], Datum::U32(0xDEAD_BEEF));
//! assert_eq!(frame[1], Datum::Str("dock".into()));
//! # Ok::<(), ringcode::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod err;
mod stream;
mod tag;
mod value;
mod varint;

pub use err::Error;
pub use stream::{State, Stream, HEADER_LEN};
pub use tag::{Tag, UNIT_LEN};
pub use value::{Datum, Value};
