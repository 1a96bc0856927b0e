//! A self-describing associative table inside one fixed buffer.
//!
//! `packtab` maps string keys to opaque byte values without allocating:
//! the header, the sorted 16-bit hash index, the collision chains, and
//! the key/value bytes all live in a single caller-owned arena. Index
//! metadata grows up from the header while key and value bytes grow down
//! from the high end, and an insert that would make the two meet fails
//! cleanly before writing anything.
//!
//! Lookups binary-search the sorted hash index in O(log n); inserts pay
//! an O(n) shift to keep it sorted, the right trade for configuration
//! tables that are written rarely and read constantly.
//!
//! ```
//! let mut arena = [0u8; 512];
//! let mut map = packtab::FixedMap::create(&mut arena, 8)?;
//! let idx = map.insert("baud", 0, &9600u32.to_le_bytes())?;
//! assert_eq!(map.find("baud"), Some(idx));
//! assert_eq!(map.value_at(idx), 9600u32.to_le_bytes());
//! # Ok::<(), packtab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod dump;
mod err;
mod layout;
mod map;

pub use err::Error;
pub use layout::NONE;
pub use map::{Entry, FixedMap};
