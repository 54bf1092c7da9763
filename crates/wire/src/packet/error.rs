use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("read out of range: need {needed} bytes, {remaining} remaining")]
    OutOfRange { needed: usize, remaining: usize },

    #[error("string field is not valid utf-8")]
    InvalidUtf8,

    #[error("value {0} does not map to an enum variant")]
    InvalidEnum(u32),

    #[error("packet size {size} exceeds the limit {max_size}")]
    MaxPacketSizeExceeded { size: usize, max_size: usize },

    #[error("length header declares {declared} bytes but {actual} are present")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl PacketError {
    pub fn out_of_range(needed: usize, remaining: usize) -> Self {
        Self::OutOfRange { needed, remaining }
    }

    pub fn max_packet_size_exceeded(size: usize, max_size: usize) -> Self {
        Self::MaxPacketSizeExceeded { size, max_size }
    }

    pub fn length_mismatch(declared: usize, actual: usize) -> Self {
        Self::LengthMismatch { declared, actual }
    }

    /// Returns true when a read ran past the available payload.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}
