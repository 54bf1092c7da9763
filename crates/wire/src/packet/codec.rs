//! Stream framing for [`Packet`]s.
//!
//! Packets ride over a byte stream framed only by their own 4-byte length
//! prefix. [`PacketCodec`] splits complete frames off the read buffer and
//! rejects declared lengths above its limit before buffering the payload.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::packet::packet::{encoded_len, read_header};
use crate::packet::{HEADER_SIZE, Packet, PacketError};

/// Default upper bound on a framed payload
pub const DEFAULT_MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

/// Largest reservation made ahead of a partially buffered frame
const MAX_RESERVE: usize = 64 * 1024;

/// A [`Decoder`]/[`Encoder`] pair for length-prefixed packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCodec {
    /// `0` disables the limit
    max_payload_size: usize,
}

impl PacketCodec {
    pub fn new(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    fn check_size(&self, size: usize) -> Result<(), PacketError> {
        if self.max_payload_size != 0 && size > self.max_payload_size {
            warn!(size, max_size = self.max_payload_size, "packet exceeds the size limit");
            return Err(PacketError::max_packet_size_exceeded(size, self.max_payload_size));
        }
        Ok(())
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PACKET_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = PacketError;

    /// Splits one complete packet off `src`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(packet))`: a full frame was buffered
    /// - `Ok(None)`: need more data
    /// - `Err(PacketError::MaxPacketSizeExceeded)`: the declared length is over the limit
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let payload_len = read_header(src);
        self.check_size(payload_len)?;

        let frame_len = HEADER_SIZE.saturating_add(payload_len);
        if src.len() < frame_len {
            src.reserve((frame_len - src.len()).min(MAX_RESERVE));
            return Ok(None);
        }

        trace!(payload_len, "decoded packet frame");
        Ok(Some(Packet::from_frame(src.split_to(frame_len))))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = PacketError;

    fn encode(&mut self, mut item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check_size(item.payload_len())?;
        encoded_len(item.payload_len())?;

        dst.extend_from_slice(item.wire_bytes());
        Ok(())
    }
}
