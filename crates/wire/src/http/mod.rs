//! Resumable HTTP/1.x parsing and message construction.
//!
//! [`HttpRequest`] and [`HttpResponse`] are fed raw bytes as they arrive from
//! the network. Each call to [`HttpParse::parse`] either finishes the message or
//! reports [`ParseStatus::NotEnoughData`], in which case the caller reads more
//! and calls `parse` again. Errors are terminal and the connection should be
//! dropped.
//!
//! The [`codec`] module wraps both parsers as `tokio_util` decoders and
//! encoders.
//!
//! # Example
//!
//! ```
//! use micro_wire::http::{HttpParse, HttpResponse, ParseStatus};
//!
//! let mut response = HttpResponse::new();
//! let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
//!
//! let (head, tail) = raw.split_at(20);
//! assert_eq!(response.parse(head).unwrap(), ParseStatus::NotEnoughData);
//! assert_eq!(response.parse(tail).unwrap(), ParseStatus::Complete);
//! assert_eq!(response.body(), b"hello");
//! ```

pub mod codec;
mod error;
mod message;
mod method;
pub mod mime;
mod parser;
mod request;
mod response;
mod text;
mod version;

use bytes::{Bytes, BytesMut};

pub use error::ParseError;
pub use error::SendError;
pub use message::{HttpMessage, ParseStatus, TransferEncoding};
pub use method::Method;
pub use parser::ParseState;
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use text::{encode_argument_list, parse_argument_list, split_lines, url_decode, url_encode};
pub use version::HttpVersion;

pub use self::mime::get_mimetype;

/// Behaviour shared by requests and responses.
pub trait HttpParse {
    /// Feeds the next bytes read from the connection.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`] is terminal; the message must be discarded.
    fn parse(&mut self, data: &[u8]) -> Result<ParseStatus, ParseError>;

    /// Serializes the message, adding default headers that are not already set.
    fn construct(&self, host: &str) -> Bytes;

    fn message(&self) -> &HttpMessage;

    fn message_mut(&mut self) -> &mut HttpMessage;

    fn state(&self) -> &ParseState;

    /// Takes the bytes that arrived after the end of a completed message.
    fn take_excess(&mut self) -> BytesMut;

    fn header(&self, name: &str) -> Option<&str> {
        self.message().header(name)
    }

    fn body(&self) -> &[u8] {
        self.message().body()
    }

    fn uri(&self) -> &str {
        self.message().uri()
    }

    fn version(&self) -> HttpVersion {
        self.message().version()
    }

    fn is_complete(&self) -> bool {
        self.state().is_complete()
    }
}

/// Either side of an HTTP exchange.
#[derive(Debug, Clone)]
pub enum HttpPacket {
    Request(HttpRequest),
    Response(HttpResponse),
}

impl HttpPacket {
    pub fn is_request(&self) -> bool {
        matches!(self, HttpPacket::Request(_))
    }

    pub fn is_response(&self) -> bool {
        matches!(self, HttpPacket::Response(_))
    }
}

impl HttpParse for HttpPacket {
    fn parse(&mut self, data: &[u8]) -> Result<ParseStatus, ParseError> {
        match self {
            HttpPacket::Request(request) => request.parse(data),
            HttpPacket::Response(response) => response.parse(data),
        }
    }

    fn construct(&self, host: &str) -> Bytes {
        match self {
            HttpPacket::Request(request) => request.construct(host),
            HttpPacket::Response(response) => response.construct(host),
        }
    }

    fn message(&self) -> &HttpMessage {
        match self {
            HttpPacket::Request(request) => request.message(),
            HttpPacket::Response(response) => response.message(),
        }
    }

    fn message_mut(&mut self) -> &mut HttpMessage {
        match self {
            HttpPacket::Request(request) => request.message_mut(),
            HttpPacket::Response(response) => response.message_mut(),
        }
    }

    fn state(&self) -> &ParseState {
        match self {
            HttpPacket::Request(request) => request.state(),
            HttpPacket::Response(response) => response.state(),
        }
    }

    fn take_excess(&mut self) -> BytesMut {
        match self {
            HttpPacket::Request(request) => request.take_excess(),
            HttpPacket::Response(response) => response.take_excess(),
        }
    }
}

impl From<HttpRequest> for HttpPacket {
    fn from(request: HttpRequest) -> Self {
        HttpPacket::Request(request)
    }
}

impl From<HttpResponse> for HttpPacket {
    fn from(response: HttpResponse) -> Self {
        HttpPacket::Response(response)
    }
}
