use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::ensure;
use crate::transport::{Role, Transport};
use crate::ws::mask::{apply_mask, next_mask_key};
use crate::ws::{FrameError, Opcode, WebFrame};

const FIN_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;
const LEN_MASK: u8 = 0x7F;

/// Base length announcing a 16-bit extended length
const LEN_16: u8 = 126;
/// Base length announcing a 64-bit extended length
const LEN_64: u8 = 127;

/// Largest payload representable in the 7-bit base length
const MAX_BASE_LEN: usize = 125;

const MASK_KEY_SIZE: usize = 4;

/// Largest step the payload buffer grows by before the bytes are in hand
const PAYLOAD_STEP: usize = 64 * 1024;

/// Fields of the fixed 2-byte frame header.
#[derive(Debug, Clone, Copy)]
struct FrameHead {
    fin: bool,
    opcode: Opcode,
    masked: bool,
    base_len: u8,
}

impl FrameHead {
    fn parse(bytes: [u8; 2]) -> Result<Self, FrameError> {
        Ok(Self {
            fin: bytes[0] & FIN_BIT != 0,
            opcode: Opcode::try_from(bytes[0] & OPCODE_MASK)?,
            masked: bytes[1] & MASK_BIT != 0,
            base_len: bytes[1] & LEN_MASK,
        })
    }

    /// Size of the extended length field that follows the fixed header.
    fn extended_len_size(&self) -> usize {
        match self.base_len {
            LEN_16 => 2,
            LEN_64 => 8,
            _ => 0,
        }
    }

    fn payload_len(&self, extended: &[u8]) -> u64 {
        match self.base_len {
            LEN_16 => u64::from(u16::from_be_bytes([extended[0], extended[1]])),
            LEN_64 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&extended[..8]);
                u64::from_be_bytes(bytes)
            }
            n => u64::from(n),
        }
    }

    /// Rejects frames whose mask bit disagrees with the receiving role or whose
    /// payload is over `max_size` (`0` meaning unbounded).
    fn validate(&self, role: Role, len: u64, max_size: usize) -> Result<usize, FrameError> {
        // servers receive masked frames, clients receive unmasked ones
        if self.masked != role.is_server() {
            warn!(%role, masked = self.masked, "frame mask bit does not match role");
            return Err(FrameError::mask_mismatch(role, self.masked));
        }

        let limit_exceeded = max_size != 0 && len > max_size as u64;
        if limit_exceeded {
            warn!(len, max_size, "frame payload exceeds the receive limit");
        }
        ensure!(!limit_exceeded, FrameError::max_packet_size_exceeded(len, max_size));

        usize::try_from(len).map_err(|_e| FrameError::max_packet_size_exceeded(len, usize::MAX))
    }
}

/// Encodes `frame` as sent by `role`, returning the wire bytes.
///
/// The frame itself is never modified; client masking works on a copy.
pub fn encode(frame: &WebFrame, role: Role) -> BytesMut {
    let mut dst = BytesMut::new();
    encode_into(frame, role, &mut dst);
    dst
}

/// Appends the wire encoding of `frame`, as sent by `role`, to `dst`.
pub fn encode_into(frame: &WebFrame, role: Role, dst: &mut BytesMut) {
    let len = frame.payload.len();
    let masked = role.is_client();

    dst.reserve(2 + 8 + MASK_KEY_SIZE + len);

    let mut first = u8::from(frame.opcode);
    if frame.fin {
        first |= FIN_BIT;
    }
    let mask_flag = if masked { MASK_BIT } else { 0 };

    if len <= MAX_BASE_LEN {
        dst.put_u8(first);
        dst.put_u8(mask_flag | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        dst.put_u8(first);
        dst.put_u8(mask_flag | LEN_16);
        dst.put_u16(len);
    } else {
        dst.put_u8(first);
        dst.put_u8(mask_flag | LEN_64);
        dst.put_u64(len as u64);
    }

    if masked {
        let key = next_mask_key();
        dst.put_slice(&key);
        let start = dst.len();
        dst.put_slice(&frame.payload);
        apply_mask(&mut dst[start..], key);
    } else {
        dst.put_slice(&frame.payload);
    }

    trace!(opcode = %frame.opcode, len, masked, "encoded websocket frame");
}

/// Encodes `frame` for the transport's role and sends all of it.
pub fn send<T: Transport + ?Sized>(transport: &mut T, frame: &WebFrame) -> Result<(), FrameError> {
    let bytes = encode(frame, transport.role());
    transport.send_all(&bytes)?;
    Ok(())
}

/// Reads exactly one frame from `transport`, validated against its role and
/// receive limit.
///
/// # Errors
///
/// - [`FrameError::MaskMismatch`] if the mask bit is wrong for the role
/// - [`FrameError::MaxPacketSizeExceeded`] if the declared length is over the limit
/// - [`FrameError::InvalidOpcode`] for reserved opcodes
/// - [`FrameError::Transport`] for transport statuses, unchanged
pub fn receive<T: Transport + ?Sized>(transport: &mut T) -> Result<WebFrame, FrameError> {
    let role = transport.role();

    let mut head = [0u8; 2];
    transport.receive_exact(&mut head)?;
    let head = FrameHead::parse(head)?;

    let mut extended = [0u8; 8];
    let extended = &mut extended[..head.extended_len_size()];
    transport.receive_exact(extended)?;
    let len = head.validate(role, head.payload_len(extended), transport.max_receive_size())?;

    let mut key = [0u8; MASK_KEY_SIZE];
    if head.masked {
        transport.receive_exact(&mut key)?;
    }

    // grows as bytes arrive, so a declared length alone never allocates
    let mut payload = BytesMut::with_capacity(len.min(PAYLOAD_STEP));
    while payload.len() < len {
        let start = payload.len();
        payload.resize(start + (len - start).min(PAYLOAD_STEP), 0);
        transport.receive_exact(&mut payload[start..])?;
    }
    if head.masked {
        apply_mask(&mut payload, key);
    }

    trace!(opcode = %head.opcode, len, fin = head.fin, "received websocket frame");
    Ok(WebFrame { opcode: head.opcode, payload: payload.freeze(), fin: head.fin })
}

/// A [`Decoder`]/[`Encoder`] for WebSocket frames over an async byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebSocketCodec {
    role: Role,
    /// `0` disables the limit
    max_payload_size: usize,
}

impl WebSocketCodec {
    pub fn new(role: Role, max_payload_size: usize) -> Self {
        Self { role, max_payload_size }
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl Decoder for WebSocketCodec {
    type Item = WebFrame;
    type Error = FrameError;

    /// Splits one complete frame off `src`.
    ///
    /// Header checks run as soon as the header bytes are buffered, so an
    /// oversized or wrongly masked frame fails before its payload arrives.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }

        let head = FrameHead::parse([src[0], src[1]])?;
        let extended_end = 2 + head.extended_len_size();
        if src.len() < extended_end {
            return Ok(None);
        }

        let len = head.validate(self.role, head.payload_len(&src[2..extended_end]), self.max_payload_size)?;
        let key_size = if head.masked { MASK_KEY_SIZE } else { 0 };
        let header_size = extended_end + key_size;
        let Some(frame_size) = header_size.checked_add(len) else {
            warn!(len, "frame length overflows the buffer size");
            return Err(FrameError::max_packet_size_exceeded(len as u64, usize::MAX - header_size));
        };
        if src.len() < frame_size {
            src.reserve((frame_size - src.len()).min(PAYLOAD_STEP));
            return Ok(None);
        }

        let mut key = [0u8; MASK_KEY_SIZE];
        key[..key_size].copy_from_slice(&src[extended_end..header_size]);

        let mut frame = src.split_to(frame_size);
        let mut payload = frame.split_off(header_size);
        if head.masked {
            apply_mask(&mut payload, key);
        }

        trace!(opcode = %head.opcode, len, fin = head.fin, "decoded websocket frame");
        Ok(Some(WebFrame { opcode: head.opcode, payload: payload.freeze(), fin: head.fin }))
    }
}

impl Encoder<WebFrame> for WebSocketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: WebFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&item, self.role, dst);
        Ok(())
    }
}

impl Encoder<&WebFrame> for WebSocketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &WebFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(item, self.role, dst);
        Ok(())
    }
}
