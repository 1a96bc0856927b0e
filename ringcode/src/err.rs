//! Error types for the `ringcode` crate.

/// Errors applicable to encoding and decoding frames.
///
/// A failed [`crate::Stream::write`] never commits its cursors, so every
/// error leaves the stream byte-identical to its state before the call.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The ring ran out of space. `param` is the frame position whose
    /// bytes no longer fit (0 is the count byte, value `i` is `i + 1`)
    /// and `offset` the ring offset where the frame would have collided
    /// with unread data.
    #[error("ring out of space encoding parameter {param} at offset {offset}")]
    BufferOverflow {
        /// Frame position whose bytes no longer fit.
        param: usize,
        /// Ring offset of the collision with unread data.
        offset: usize,
    },

    /// The ring holds fewer bytes than the frame being decoded claims.
    #[error("not enough buffered bytes to finish decoding the frame")]
    BufferUnderflow,

    /// A tag byte outside the closed enumeration. A configuration error,
    /// distinct from running out of space.
    #[error("unknown type tag {0:#04x}")]
    InvalidType(u8),

    /// A decoded payload contradicts its descriptor (bad terminator,
    /// varint wider than its declared width, malformed UTF-8).
    #[error("malformed payload: {0}")]
    InvalidData(&'static str),

    /// The stream is locked by a reader; unlock before writing.
    #[error("stream is locked")]
    Locked,

    /// A frame cannot describe more than 255 values.
    #[error("frame carries more than 255 values")]
    FrameTooLarge,

    /// The buffer cannot hold the stream header plus a minimal ring.
    #[error("buffer too small for a stream")]
    TooSmall,

    /// The buffer handed to [`crate::Stream::open`] failed validation.
    #[error("stream header failed validation: {0}")]
    InvalidHeader(&'static str),
}
