//! Length-prefixed binary messages in network byte order.
//!
//! A [`Packet`] is a byte buffer with a 4-byte big-endian length header
//! followed by a payload of fixed-width fields and length-prefixed strings and
//! collections:
//!
//! ```text
//! [payload length: u32 BE][field][field]...
//! ```
//!
//! The payload is not self-describing. Readers must request the same types in
//! the same order the writer used; a mismatched read silently yields wrong
//! values unless it runs past the end, which fails with
//! [`PacketError::OutOfRange`].
//!
//! # Example
//!
//! ```
//! use micro_wire::packet::Packet;
//!
//! let mut packet = Packet::new();
//! packet.write(&7u32).write("name").write(&(-3i32, String::from("x")));
//!
//! let mut received = Packet::from_wire(packet.wire_bytes()).unwrap();
//! assert_eq!(received.read::<u32>().unwrap(), 7);
//! assert_eq!(received.read::<String>().unwrap(), "name");
//! assert_eq!(received.read::<(i32, String)>().unwrap(), (-3, "x".to_string()));
//! assert!(received.read::<u8>().is_err());
//! ```

mod codec;
mod error;
mod pack;
mod packet;

pub use codec::{DEFAULT_MAX_PACKET_SIZE, PacketCodec};
pub use error::PacketError;
pub use pack::{Pack, Unpack};
pub use packet::{HEADER_SIZE, Packet};
