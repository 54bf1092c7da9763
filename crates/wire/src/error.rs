use thiserror::Error;

use crate::http::{ParseError, SendError};
use crate::packet::PacketError;
use crate::transport::TransportError;
use crate::ws::FrameError;

/// Any failure raised by this crate, for callers that drive several protocols
/// over one connection and want a single error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("http parse error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("http send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("websocket frame error: {source}")]
    Frame {
        #[from]
        source: FrameError,
    },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("packet error: {source}")]
    Packet {
        #[from]
        source: PacketError,
    },
}

impl Error {
    /// True when the peer went away, whichever layer noticed it.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            Error::Transport { source: TransportError::Disconnected }
                | Error::Frame { source: FrameError::Transport { source: TransportError::Disconnected } }
        )
    }
}
