use std::io;
use thiserror::Error;

use crate::transport::{Role, TransportError};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("mask bit {masked} is not allowed for frames received by a {role}")]
    MaskMismatch { role: Role, masked: bool },

    #[error("frame payload of {size} bytes exceeds the limit {max_size}")]
    MaxPacketSizeExceeded { size: u64, max_size: usize },

    #[error("invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl FrameError {
    pub fn mask_mismatch(role: Role, masked: bool) -> Self {
        Self::MaskMismatch { role, masked }
    }

    pub fn max_packet_size_exceeded(size: u64, max_size: usize) -> Self {
        Self::MaxPacketSizeExceeded { size, max_size }
    }
}
