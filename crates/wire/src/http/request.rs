use std::ops::{Deref, DerefMut};

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use tracing::trace;

use crate::config::Limits;
use crate::http::message::put_header;
use crate::http::parser::Parser;
use crate::http::{
    HttpMessage, HttpParse, HttpVersion, Method, ParseError, ParseState, ParseStatus, encode_argument_list,
    parse_argument_list,
};
use crate::utils::ensure;

/// Initial buffer size reserved for the start line and headers
const INIT_HEADER_SIZE: usize = 1024;

/// An HTTP request, parsed incrementally from the wire or built up for sending.
///
/// Dereferences to [`HttpMessage`] for header, parameter and body access.
///
/// ```
/// use micro_wire::http::{HttpParse, HttpRequest, Method};
///
/// let mut request = HttpRequest::new();
/// assert!(!request.parse(b"GET /search?q=rust HTTP/1.1\r\nHost: a\r\n").unwrap().is_complete());
/// assert!(request.parse(b"\r\n").unwrap().is_complete());
///
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.uri(), "/search");
/// assert_eq!(request.get_param("q"), Some("rust"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    message: HttpMessage,
    parser: Parser,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { message: HttpMessage::new(), parser: Parser::new(limits) }
    }

    pub fn limits(&self) -> &Limits {
        self.parser.limits()
    }

    pub fn into_message(self) -> HttpMessage {
        self.message
    }

    fn parse_post_params(&mut self) {
        let form = String::from_utf8_lossy(self.message.body()).into_owned();
        for (key, value) in parse_argument_list(&form) {
            self.message.set_post_param(key.to_lowercase(), value);
        }
    }
}

impl HttpParse for HttpRequest {
    fn parse(&mut self, data: &[u8]) -> Result<ParseStatus, ParseError> {
        let status = self.parser.parse(&mut self.message, data, parse_request_line)?;

        if !self.parser.state().header_ended() {
            self.message.set_method(Method::Partial);
        } else if status.is_complete() && self.message.method() == Method::Post && self.message.post_params().is_empty() {
            self.parse_post_params();
        }
        Ok(status)
    }

    fn construct(&self, host: &str) -> Bytes {
        let message = &self.message;
        let form = encode_argument_list(message.post_params());

        let mut dst = BytesMut::with_capacity(INIT_HEADER_SIZE + form.len() + message.body().len());
        dst.put_slice(message.method().as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(message.uri().as_bytes());
        if !message.get_params().is_empty() {
            dst.put_u8(b'?');
            dst.put_slice(encode_argument_list(message.get_params()).as_bytes());
        }
        dst.put_u8(b' ');
        dst.put_slice(message.version().as_str().as_bytes());
        dst.put_slice(b"\r\n");

        message.put_headers(&mut dst);
        if !message.headers().contains_key(CONNECTION) {
            put_header(&mut dst, CONNECTION.as_str(), b"keep-alive");
        }
        if !message.headers().contains_key(HOST) {
            put_header(&mut dst, HOST.as_str(), host.as_bytes());
        }
        if !form.is_empty() && !message.headers().contains_key(CONTENT_TYPE) {
            put_header(&mut dst, CONTENT_TYPE.as_str(), mime::APPLICATION_WWW_FORM_URLENCODED.as_ref().as_bytes());
        }
        if !message.headers().contains_key(CONTENT_LENGTH) && !message.headers().contains_key(TRANSFER_ENCODING) {
            let content_length = form.len() + message.body().len();
            put_header(&mut dst, CONTENT_LENGTH.as_str(), content_length.to_string().as_bytes());
        }
        dst.put_slice(b"\r\n");

        message.put_body(form.as_bytes(), &mut dst);
        trace!(method = %message.method(), uri = message.uri(), size = dst.len(), "constructed http request");
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

impl Deref for HttpRequest {
    type Target = HttpMessage;

    fn deref(&self) -> &Self::Target {
        &self.message
    }
}

impl DerefMut for HttpRequest {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.message
    }
}

/// Parses `METHOD /target?query VERSION`.
fn parse_request_line(message: &mut HttpMessage, line: &str) -> Result<(), ParseError> {
    let mut parts = line.split_ascii_whitespace();
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::invalid_request_line(format!("expected `METHOD TARGET VERSION`, got {line:?}")));
    };
    ensure!(target.starts_with('/'), ParseError::invalid_request_line(format!("target {target:?} does not start with '/'")));

    let version = HttpVersion::try_from(version)?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    message.set_method(Method::from(method));
    message.set_uri(path);
    message.set_version(version);
    for (key, value) in parse_argument_list(query) {
        message.set_get_param(key, value);
    }
    Ok(())
}
