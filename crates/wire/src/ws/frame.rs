use std::fmt;

use bytes::Bytes;

use crate::ws::FrameError;

/// WebSocket frame type tag, the low nibble of the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Disconnect = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl Opcode {
    /// Control frames (disconnect, ping, pong) have the high opcode bit set.
    #[inline]
    pub fn is_control(self) -> bool {
        (self as u8) & 0x08 != 0
    }
}

impl TryFrom<u8> for Opcode {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Disconnect),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            v => Err(FrameError::InvalidOpcode(v)),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Continuation => "continuation",
            Opcode::Text => "text",
            Opcode::Binary => "binary",
            Opcode::Disconnect => "disconnect",
            Opcode::Ping => "ping",
            Opcode::Pong => "pong",
        };
        f.write_str(name)
    }
}

/// A single WebSocket frame.
///
/// Frames are never reassembled here: a message split over `Continuation`
/// frames arrives as one `WebFrame` per wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebFrame {
    pub opcode: Opcode,
    pub payload: Bytes,
    pub fin: bool,
}

impl WebFrame {
    pub fn new(opcode: Opcode, payload: impl Into<Bytes>, fin: bool) -> Self {
        Self { opcode, payload: payload.into(), fin }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self::new(Opcode::Text, text, true)
    }

    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(Opcode::Binary, data, true)
    }

    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(Opcode::Ping, data, true)
    }

    pub fn pong(data: impl Into<Bytes>) -> Self {
        Self::new(Opcode::Pong, data, true)
    }

    pub fn disconnect() -> Self {
        Self::new(Opcode::Disconnect, Bytes::new(), true)
    }

    /// Returns the payload as text if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
