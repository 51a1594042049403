//! Inbound byte accumulation and frame extraction.
//!
//! A TCP read can hand over half a frame, exactly one frame, or several
//! frames glued together. [`FrameBuffer`] absorbs every chunk in arrival
//! order and cuts complete frames off the front one at a time. Bytes that
//! do not yet form a complete frame stay in the buffer untouched, header
//! included, until the rest arrives.

use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{Frame, HEADER_LEN, ID_LEN, ProtocolError};

/// Initial capacity of a fresh buffer.
const INITIAL_CAPACITY: usize = 1024;

/// Default upper bound on a declared frame length: 1 MiB.
const DEFAULT_MAX_FRAME_LEN: u32 = 1_048_576;

/// Configuration for the framing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Largest accepted value of the length header, in bytes.
    ///
    /// A peer that declares more than this is cut off instead of being
    /// allowed to grow the buffer without bound. `None` disables the check
    /// and the session will wait as long as it takes.
    pub max_frame_len: Option<u32>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: Some(DEFAULT_MAX_FRAME_LEN),
        }
    }
}

/// Growable queue of unconsumed inbound bytes.
///
/// Owned by exactly one session and driven by one reader task; there is
/// no internal locking.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    config: FrameConfig,
}

impl FrameBuffer {
    /// Creates an empty buffer with the given limits.
    pub fn new(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
            config,
        }
    }

    /// Appends a chunk of raw bytes to the end of the buffer.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Attempts to cut one complete frame off the front of the buffer.
    ///
    /// Returns `Ok(None)` while the buffer holds fewer than 4 bytes or
    /// fewer than `length` bytes after the header; nothing is consumed in
    /// that case. Call repeatedly until it returns `Ok(None)`, since a
    /// single append may have delivered several frames.
    ///
    /// # Errors
    /// - [`ProtocolError::FrameTooShort`]: declared length below 4
    /// - [`ProtocolError::FrameTooLarge`]: declared length above
    ///   [`FrameConfig::max_frame_len`]
    ///
    /// Neither error consumes bytes. Both mean the stream is unusable.
    pub fn try_extract(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let Some(len) = self.peek_len() else {
            return Ok(None);
        };

        if (len as usize) < ID_LEN {
            return Err(ProtocolError::FrameTooShort(len));
        }
        if let Some(max) = self.config.max_frame_len {
            if len > max {
                return Err(ProtocolError::FrameTooLarge { len, max });
            }
        }

        if self.buf.len() - HEADER_LEN < len as usize {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(HEADER_LEN + len as usize);
        frame.advance(HEADER_LEN);
        let message_id = frame.get_u32_le();

        Ok(Some(Frame {
            message_id,
            body: frame.freeze(),
        }))
    }

    /// Number of buffered, not yet consumed bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reads the length header without consuming it.
    fn peek_len(&self) -> Option<u32> {
        let mut header = self.buf.get(..HEADER_LEN)?;
        Some(header.get_u32_le())
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(FrameConfig::default())
    }
}
