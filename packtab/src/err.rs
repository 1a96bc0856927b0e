//! Error types for the `packtab` crate.

/// Errors returned by table construction and mutation.
///
/// Lookup misses are not errors; [`crate::FixedMap::find`] and friends
/// return `Option` instead. Every error here leaves the arena exactly as
/// it was before the failed call.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key/value heap would collide with the metadata regions, or the
    /// collision pile is out of slots.
    #[error("arena is out of key/value space")]
    BufferOverflow,

    /// The table already holds `capacity` entries.
    #[error("entry capacity exhausted")]
    CapacityExhausted,

    /// Keys must be non-empty and free of interior NUL bytes.
    #[error("key is empty or contains a NUL byte")]
    InvalidKey,

    /// The arena handed to [`crate::FixedMap::open`] failed validation.
    #[error("arena header failed validation: {0}")]
    InvalidHeader(&'static str),

    /// The arena handed to [`crate::FixedMap::create`] cannot hold the
    /// index regions for the requested capacity.
    #[error("arena too small for the requested capacity")]
    TooSmall,

    /// The destination buffer passed to [`crate::FixedMap::remove_copy`]
    /// cannot hold the stored value.
    #[error("destination buffer too small for the value ({needed} bytes)")]
    DestinationTooSmall {
        /// Length of the stored value in bytes.
        needed: usize,
    },
}
