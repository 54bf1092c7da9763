//! Wire-level building blocks for network protocols
//!
//! This crate provides three independent codecs that share a common shape: they
//! consume bytes as they arrive, never block, and report "need more input"
//! separately from malformed input.
//!
//! # Features
//!
//! - Resumable HTTP/1.0 and HTTP/1.1 request and response parsing, including
//!   chunked bodies, with message construction for the opposite direction
//! - Single-frame WebSocket encoding and decoding, client masking included
//! - A length-prefixed, big-endian binary [`Packet`](packet::Packet) format with a
//!   read cursor
//! - `tokio_util::codec` adapters for all three
//! - Configurable header and body size limits
//!
//! # Example
//!
//! ```
//! use micro_wire::http::{HttpParse, HttpRequest, Method};
//! use micro_wire::packet::Packet;
//! use micro_wire::transport::Role;
//! use micro_wire::ws::{self, WebFrame};
//!
//! let mut request = HttpRequest::new();
//! request.parse(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap();
//! assert_eq!(request.method(), Method::Post);
//!
//! let frame = ws::encode(&WebFrame::text("hello"), Role::Server);
//! assert_eq!(&frame[..], b"\x81\x05hello");
//!
//! let mut packet = Packet::new();
//! packet.write(&42u16);
//! assert_eq!(packet.wire_bytes(), [0, 0, 0, 2, 0, 42]);
//! ```
//!
//! # Architecture
//!
//! - [`http`]: incremental parsers, message construction and MIME lookup
//! - [`ws`]: WebSocket frames over a [`transport::Transport`] or a tokio codec
//! - [`packet`]: binary packets, the [`packet::Pack`]/[`packet::Unpack`] traits and a length-delimited codec
//! - [`transport`]: the byte-transport seam and a `std::io` adapter
//! - [`config`]: parser size limits
//!
//! # Error Handling
//!
//! Each module has its own error type; [`Error`] wraps all of them:
//!
//! - [`http::ParseError`]: malformed or oversized HTTP input
//! - [`ws::FrameError`]: mask violations, oversized frames and transport failures
//! - [`packet::PacketError`]: reads past the end of a packet and framing errors
//! - [`transport::TransportError`]: disconnects, would-block and timeouts
//!
//! Running out of input is never an error. The HTTP parsers return
//! [`http::ParseStatus::NotEnoughData`] and the tokio decoders return `Ok(None)`.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - No TLS, compression or WebSocket extensions
//! - Fragmented WebSocket messages are not reassembled
//! - Maximum header size: 8KB and maximum body size: 8MB by default

pub mod config;
mod error;
pub mod http;
pub mod packet;
pub mod transport;
pub mod ws;

mod utils;
pub(crate) use utils::ensure;

pub use error::Error;
