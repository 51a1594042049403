//! Error types for the protocol layer.
//!
//! An incomplete frame is not an error: [`FrameBuffer::try_extract`]
//! reports it as `Ok(None)` and waits for more bytes. The variants below
//! are the cases where waiting can never help.
//!
//! [`FrameBuffer::try_extract`]: crate::FrameBuffer::try_extract

/// Errors that can occur while framing or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The declared frame length is above the configured maximum.
    ///
    /// The stream cannot be resynchronized past this header, so the
    /// session should be closed.
    #[error("frame length {len} exceeds maximum {max}")]
    FrameTooLarge {
        /// Length declared in the header.
        len: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The declared frame length cannot even hold the 4-byte message id.
    #[error("frame length {0} is shorter than the message id")]
    FrameTooShort(u32),

    /// The outgoing body does not fit in a `u32` length header.
    #[error("body of {0} bytes does not fit in a frame")]
    BodyTooLarge(usize),
}
