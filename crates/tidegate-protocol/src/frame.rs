//! A single decoded frame and the encoder for outgoing frames.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ProtocolError;

/// Length of the frame header (the `u32` length field).
pub const HEADER_LEN: usize = 4;

/// Length of the message id that opens every frame payload.
pub const ID_LEN: usize = 4;

/// One complete protocol message.
///
/// `body` is a [`Bytes`] handle: cloning a frame or handing the body to a
/// dispatcher never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Application-level message id. Not validated by the framing layer.
    pub message_id: u32,
    /// Everything after the message id.
    pub body: Bytes,
}

impl Frame {
    /// Creates a frame from an id and a body.
    pub fn new(message_id: u32, body: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            body: body.into(),
        }
    }

    /// Encodes this frame into wire bytes.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        encode_frame(self.message_id, &self.body)
    }
}

/// Builds `length || message_id || body` ready to be written in one go.
///
/// # Errors
/// Returns [`ProtocolError::BodyTooLarge`] when `ID_LEN + body.len()` does
/// not fit in the `u32` length header.
pub fn encode_frame(
    message_id: u32,
    body: &[u8],
) -> Result<Bytes, ProtocolError> {
    let len = u32::try_from(ID_LEN + body.len())
        .map_err(|_| ProtocolError::BodyTooLarge(body.len()))?;

    let mut out = BytesMut::with_capacity(HEADER_LEN + len as usize);
    out.put_u32_le(len);
    out.put_u32_le(message_id);
    out.put_slice(body);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_matches_wire_layout() {
        let bytes = encode_frame(1, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();

        assert_eq!(
            bytes.as_ref(),
            &[0x08, 0, 0, 0, 0x01, 0, 0, 0, 0xAA, 0xBB, 0xCC, 0xDD]
        );
    }

    #[test]
    fn test_encode_frame_empty_body_declares_length_four() {
        let bytes = encode_frame(0x0102_0304, &[]).unwrap();

        assert_eq!(bytes.as_ref(), &[4, 0, 0, 0, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_encode_frame_length_excludes_header() {
        let body = vec![7u8; 300];
        let bytes = encode_frame(9, &body).unwrap();

        let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(declared as usize, ID_LEN + body.len());
        assert_eq!(bytes.len(), HEADER_LEN + ID_LEN + body.len());
    }

    #[test]
    fn test_frame_encode_uses_own_fields() {
        let frame = Frame::new(42, vec![1, 2, 3]);

        assert_eq!(frame.encode().unwrap(), encode_frame(42, &[1, 2, 3]).unwrap());
    }
}
