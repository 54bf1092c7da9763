//! The narrow byte-transport interface the WebSocket codec reads from.
//!
//! Socket setup, TLS and multiplexing live outside this crate. Anything that
//! can move raw bytes implements [`Transport`]; [`StreamTransport`] adapts any
//! blocking or non-blocking `std::io` stream.

mod stream;

pub use stream::StreamTransport;

use std::fmt;
use std::io;
use thiserror::Error;

/// Which end of a WebSocket connection a transport belongs to.
///
/// Clients mask every frame they send; servers never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    #[inline]
    pub fn is_client(self) -> bool {
        matches!(self, Role::Client)
    }

    #[inline]
    pub fn is_server(self) -> bool {
        matches!(self, Role::Server)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => f.write_str("client"),
            Role::Server => f.write_str("server"),
        }
    }
}

/// Statuses originating in the transport. Codecs pass these through unchanged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer disconnected")]
    Disconnected,

    #[error("operation would block")]
    WouldBlock,

    #[error("operation timed out")]
    Timeout,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl TransportError {
    /// Classifies an `io::Error` into the transport status it represents.
    pub fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Disconnected,
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io { source: e },
        }
    }
}

/// Raw byte transport consumed by the WebSocket frame codec.
pub trait Transport {
    /// Sends `data`, returning how many bytes were accepted.
    fn send_raw(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Reads whatever is available into `buf`, returning the byte count.
    ///
    /// A return of `Ok(0)` means the peer closed the connection.
    fn receive_raw(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Fills `buf` completely.
    ///
    /// Retries short reads and `WouldBlock`; any other status is terminal.
    fn receive_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.receive_raw(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => filled += n,
                Err(TransportError::WouldBlock) => std::thread::yield_now(),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Sends all of `data`, looping over partial writes.
    fn send_all(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            match self.send_raw(data) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => data = &data[n..],
                Err(TransportError::WouldBlock) => std::thread::yield_now(),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Largest payload the receiving side accepts, `0` meaning unbounded.
    fn max_receive_size(&self) -> usize {
        0
    }

    fn role(&self) -> Role;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out one byte per call and interleaves a `WouldBlock`.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        block_next: bool,
    }

    impl Transport for Trickle {
        fn send_raw(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            Ok(data.len())
        }

        fn receive_raw(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            if self.block_next {
                self.block_next = false;
                return Err(TransportError::WouldBlock);
            }
            self.block_next = true;
            if self.pos == self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }

        fn role(&self) -> Role {
            Role::Server
        }
    }

    #[test]
    fn receive_exact_retries_short_reads() {
        let mut transport = Trickle { data: b"hello".to_vec(), pos: 0, block_next: true };
        let mut buf = [0u8; 5];
        transport.receive_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(transport.max_receive_size(), 0);
    }

    #[test]
    fn receive_exact_reports_disconnect() {
        let mut transport = Trickle { data: b"hi".to_vec(), pos: 0, block_next: false };
        let mut buf = [0u8; 4];
        let result = transport.receive_exact(&mut buf);
        assert!(matches!(result, Err(TransportError::Disconnected)));
    }

    #[test]
    fn io_errors_are_classified() {
        assert!(matches!(
            TransportError::from_io(io::Error::from(io::ErrorKind::UnexpectedEof)),
            TransportError::Disconnected
        ));
        assert!(matches!(TransportError::from_io(io::Error::from(io::ErrorKind::WouldBlock)), TransportError::WouldBlock));
        assert!(matches!(TransportError::from_io(io::Error::from(io::ErrorKind::TimedOut)), TransportError::Timeout));
        assert!(matches!(
            TransportError::from_io(io::Error::from(io::ErrorKind::PermissionDenied)),
            TransportError::Io { .. }
        ));
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Client.to_string(), "client");
        assert!(Role::Server.is_server());
        assert!(!Role::Server.is_client());
    }
}
