use std::io::{Read, Write};

use tracing::trace;

use super::{Role, Transport, TransportError};

/// Adapts a `std::io` stream (a `TcpStream`, a `UnixStream`, an in-memory
/// cursor) to [`Transport`].
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    role: Role,
    max_receive_size: usize,
}

impl<S> StreamTransport<S>
where
    S: Read + Write,
{
    pub fn new(stream: S, role: Role) -> Self {
        Self { stream, role, max_receive_size: 0 }
    }

    /// Caps the payload size accepted by the frame decoder, `0` meaning unbounded.
    #[must_use]
    pub fn with_max_receive_size(mut self, max_receive_size: usize) -> Self {
        self.max_receive_size = max_receive_size;
        self
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: Read + Write,
{
    fn send_raw(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let written = self.stream.write(data).map_err(TransportError::from_io)?;
        trace!(written, "sent raw bytes");
        Ok(written)
    }

    fn receive_raw(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let read = self.stream.read(buf).map_err(TransportError::from_io)?;
        trace!(read, "received raw bytes");
        Ok(read)
    }

    fn max_receive_size(&self) -> usize {
        self.max_receive_size
    }

    fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_and_writes_through_stream() {
        let mut transport = StreamTransport::new(Cursor::new(Vec::new()), Role::Client).with_max_receive_size(16);
        transport.send_all(b"ping").unwrap();
        assert_eq!(transport.get_ref().get_ref().as_slice(), b"ping");
        assert_eq!(transport.max_receive_size(), 16);
        assert_eq!(transport.role(), Role::Client);

        transport.get_mut().set_position(0);
        let mut buf = [0u8; 4];
        transport.receive_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        let mut more = [0u8; 1];
        assert!(matches!(transport.receive_exact(&mut more), Err(TransportError::Disconnected)));
    }
}
