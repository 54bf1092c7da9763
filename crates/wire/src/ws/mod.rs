//! Single-frame WebSocket codec.
//!
//! ```text
//! [2-byte header][extended length 0/2/8][mask key 0/4][payload]
//! ```
//!
//! Header bits, most significant first: `fin`, three reserved bits, a 4-bit
//! [`Opcode`], the mask flag and a 7-bit base length (`126` and `127` announce a
//! 16- or 64-bit extended length). Clients mask every payload, servers never do.
//!
//! Two drivers share the same wire rules:
//!
//! - [`send`] / [`receive`] work synchronously against a [`Transport`](crate::transport::Transport),
//!   pulling exactly the bytes each field needs
//! - [`WebSocketCodec`] plugs into `tokio_util::codec::Framed*`
//!
//! Fragmented messages are not reassembled; each call yields one wire frame.

mod codec;
mod error;
mod frame;
mod mask;

pub use codec::{WebSocketCodec, encode, encode_into, receive, send};
pub use error::FrameError;
pub use frame::{Opcode, WebFrame};
pub use mask::{apply_mask, next_mask_key};
