use std::ops::{Deref, DerefMut};

use bytes::{BufMut, Bytes, BytesMut};
use http::StatusCode;
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use tracing::trace;

use crate::config::Limits;
use crate::http::message::put_header;
use crate::http::parser::Parser;
use crate::http::{HttpMessage, HttpParse, HttpVersion, ParseError, ParseState, ParseStatus};

const INIT_HEADER_SIZE: usize = 1024;

/// An HTTP response, parsed incrementally from the wire or built up for sending.
///
/// Chunked bodies are collapsed in place while parsing, so once complete
/// [`body`](HttpMessage::body) holds the decoded payload.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    message: HttpMessage,
    parser: Parser,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { message: HttpMessage::new(), parser: Parser::new(limits) }
    }

    /// Creates a response carrying `status` and `body`, ready to `construct`.
    pub fn with_body(status: StatusCode, body: impl AsRef<[u8]>) -> Self {
        let mut response = Self::new();
        response.message.set_status(status);
        response.message.set_body(body);
        response
    }

    pub fn limits(&self) -> &Limits {
        self.parser.limits()
    }

    pub fn into_message(self) -> HttpMessage {
        self.message
    }
}

impl HttpParse for HttpResponse {
    fn parse(&mut self, data: &[u8]) -> Result<ParseStatus, ParseError> {
        self.parser.parse(&mut self.message, data, parse_status_line)
    }

    /// Builds the response bytes. `host` is not used by responses.
    fn construct(&self, _host: &str) -> Bytes {
        let message = &self.message;
        let status = message.status();

        let mut dst = BytesMut::with_capacity(INIT_HEADER_SIZE + message.body().len());
        dst.put_slice(message.version().as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(status.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(status.canonical_reason().unwrap_or_default().as_bytes());
        dst.put_slice(b"\r\n");

        message.put_headers(&mut dst);
        if !message.headers().contains_key(CONNECTION) {
            put_header(&mut dst, CONNECTION.as_str(), b"keep-alive");
        }
        if !message.headers().contains_key(CONTENT_TYPE) {
            put_header(&mut dst, CONTENT_TYPE.as_str(), mime::TEXT_HTML_UTF_8.as_ref().as_bytes());
        }
        if !message.headers().contains_key(CONTENT_LENGTH) && !message.headers().contains_key(TRANSFER_ENCODING) {
            put_header(&mut dst, CONTENT_LENGTH.as_str(), message.body().len().to_string().as_bytes());
        }
        dst.put_slice(b"\r\n");

        message.put_body(b"", &mut dst);
        trace!(status = status.as_u16(), size = dst.len(), "constructed http response");
        dst.freeze()
    }

    fn message(&self) -> &HttpMessage {
        &self.message
    }

    fn message_mut(&mut self) -> &mut HttpMessage {
        &mut self.message
    }

    fn state(&self) -> &ParseState {
        self.parser.state()
    }

    fn take_excess(&mut self) -> BytesMut {
        self.parser.take_excess()
    }
}

impl Deref for HttpResponse {
    type Target = HttpMessage;

    fn deref(&self) -> &Self::Target {
        &self.message
    }
}

impl DerefMut for HttpResponse {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.message
    }
}

/// Parses `VERSION CODE [REASON]`. The reason phrase is ignored.
fn parse_status_line(message: &mut HttpMessage, line: &str) -> Result<(), ParseError> {
    let mut parts = line.splitn(3, ' ');
    let (Some(version), Some(code)) = (parts.next(), parts.next()) else {
        return Err(ParseError::invalid_status_line(format!("expected `VERSION CODE REASON`, got {line:?}")));
    };

    let version = HttpVersion::try_from(version)?;
    let status = code
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ParseError::invalid_status_line(format!("invalid status code {code:?}")))?;

    message.set_version(version);
    message.set_status(status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use indoc::indoc;

    #[test]
    fn test_basic_response() {
        let str = indoc! {r##"
        HTTP/1.1 404 Not Found
        Content-Type: text/plain
        Content-Length: 9

        not found"##};

        let mut response = HttpResponse::new();
        assert!(response.parse(str.as_bytes()).unwrap().is_complete());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.version(), HttpVersion::Http1_1);
        assert_eq!(response.method(), Method::Unknown);
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.body(), b"not found");
    }

    #[test]
    fn test_chunked_response() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Content-Type: text/plain
        Transfer-Encoding: chunked

        7
        Mozilla
        9
        Developer
        7
        Network
        0

        "##}
        .replace('\n', "\r\n");

        let mut response = HttpResponse::new();
        assert!(response.parse(str.as_bytes()).unwrap().is_complete());
        assert_eq!(response.body(), b"MozillaDeveloperNetwork");
        assert_eq!(response.state().chunk_offset(), 23);
    }

    #[test]
    fn test_chunked_split_feed() {
        let str = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\nMozilla\r\n9\r\nDeveloper\r\n7\r\nNetwork\r\n0\r\n\r\n";
        let bytes = str.as_bytes();

        for offset in 0..=bytes.len() {
            let mut response = HttpResponse::new();
            let first = response.parse(&bytes[..offset]).unwrap();
            assert_eq!(first.is_complete(), offset == bytes.len(), "offset {offset}");
            assert!(response.parse(&bytes[offset..]).unwrap().is_complete(), "offset {offset}");
            assert_eq!(response.body(), b"MozillaDeveloperNetwork", "offset {offset}");
        }
    }

    #[test]
    fn test_no_body() {
        let mut response = HttpResponse::new();
        assert!(response.parse(b"HTTP/1.0 204 No Content\r\n\r\n").unwrap().is_complete());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.version(), HttpVersion::Http1_0);
    }

    #[test]
    fn test_missing_reason_phrase() {
        let mut response = HttpResponse::new();
        assert!(response.parse(b"HTTP/1.1 200\r\n\r\n").unwrap().is_complete());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_invalid_status_lines() {
        for line in ["HTTP/1.1\r\n\r\n", "HTTP/1.1 abc OK\r\n\r\n", "HTTP/1.1 99 Low\r\n\r\n"] {
            let mut response = HttpResponse::new();
            assert!(matches!(response.parse(line.as_bytes()), Err(ParseError::InvalidStatusLine { .. })), "{line:?}");
        }

        let mut response = HttpResponse::new();
        assert!(matches!(response.parse(b"SPDY/3 200 OK\r\n\r\n"), Err(ParseError::InvalidVersion(_))));
    }

    #[test]
    fn test_body_limit() {
        let mut response = HttpResponse::with_limits(Limits::default().with_max_body_size(4));
        let result = response.parse(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
        assert!(matches!(result, Err(ParseError::TooLargeBody { current_size: 5, max_size: 4 })));
    }

    #[test]
    fn test_construct() {
        let response = HttpResponse::with_body(StatusCode::OK, "<h1>hi</h1>");
        let expected = indoc! {r##"
        HTTP/1.1 200 OK
        connection: keep-alive
        content-type: text/html; charset=utf-8
        content-length: 11

        <h1>hi</h1>"##}
        .replace('\n', "\r\n");
        assert_eq!(&response.construct("")[..], expected.as_bytes());
    }

    #[test]
    fn test_construct_chunked_round_trip() {
        let mut response = HttpResponse::with_body(StatusCode::CREATED, "streamed payload");
        response.set_header("Transfer-Encoding", "chunked").unwrap();
        response.set_header("Content-Type", "application/json").unwrap();

        let bytes = response.construct("");
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(!text.contains("content-length"));

        let mut parsed = HttpResponse::new();
        assert!(parsed.parse(&bytes).unwrap().is_complete());
        assert_eq!(parsed.status(), StatusCode::CREATED);
        assert_eq!(parsed.header("content-type"), Some("application/json"));
        assert_eq!(parsed.body(), b"streamed payload");
    }
}
