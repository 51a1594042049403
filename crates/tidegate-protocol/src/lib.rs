//! Wire protocol for Tidegate.
//!
//! Every message on the wire is one frame, little-endian throughout:
//!
//! ```text
//! +------------------+--------------------+------------------------------+
//! | length (4 bytes) | message id (4 B)   | body (length - 4 bytes)      |
//! | u32 LE           | u32 LE             |                              |
//! +------------------+--------------------+------------------------------+
//! ```
//!
//! `length` counts the message id and the body, never itself, so the
//! smallest valid frame declares a length of 4.
//!
//! - **Frames** ([`Frame`], [`encode_frame`]): building outgoing bytes.
//! - **Buffering** ([`FrameBuffer`]): accumulating inbound chunks and
//!   cutting complete frames off the front.
//! - **Errors** ([`ProtocolError`]): the conditions a stream cannot
//!   recover from.
//!
//! ```text
//! Transport (chunks) → Protocol (Frame) → Session (identity, liveness)
//! ```

mod buffer;
mod error;
mod frame;

pub use buffer::{FrameBuffer, FrameConfig};
pub use error::ProtocolError;
pub use frame::{Frame, HEADER_LEN, ID_LEN, encode_frame};
