//! State shared by HTTP requests and responses.

use std::collections::{BTreeMap, BTreeSet};

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::trace;

use crate::http::{HttpVersion, Method, ParseError};

/// Outcome of feeding bytes to a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The message is fully parsed
    Complete,
    /// More bytes are needed; call `parse` again once they arrive
    NotEnoughData,
}

impl ParseStatus {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, ParseStatus::Complete)
    }
}

/// Codings named by a `Transfer-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferEncoding {
    Chunked,
    Compress,
    Deflate,
    Gzip,
    Identity,
}

impl TransferEncoding {
    /// Parses a single coding token, case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        [
            ("chunked", Self::Chunked),
            ("compress", Self::Compress),
            ("deflate", Self::Deflate),
            ("gzip", Self::Gzip),
            ("identity", Self::Identity),
        ]
        .into_iter()
        .find_map(|(name, coding)| token.eq_ignore_ascii_case(name).then_some(coding))
    }
}

/// Headers, parameters, body and start-line fields of one HTTP message.
///
/// Header names are lowercased on insertion and lookup. A fresh message has
/// uri `/`, status `200 OK`, method [`Method::Unknown`] and version HTTP/1.1.
#[derive(Debug, Clone)]
pub struct HttpMessage {
    headers: HeaderMap,
    get_params: BTreeMap<String, String>,
    post_params: BTreeMap<String, String>,
    body: BytesMut,
    uri: String,
    status: StatusCode,
    method: Method,
    version: HttpVersion,
    transfer_encodings: BTreeSet<TransferEncoding>,
}

impl Default for HttpMessage {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            get_params: BTreeMap::new(),
            post_params: BTreeMap::new(),
            body: BytesMut::new(),
            uri: String::from("/"),
            status: StatusCode::OK,
            method: Method::Unknown,
            version: HttpVersion::Http1_1,
            transfer_encodings: BTreeSet::new(),
        }
    }
}

impl HttpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one `Name: value` line into the header map.
    ///
    /// Leading spaces and tabs in the value are skipped, and the value ends at
    /// the first byte outside printable ASCII (32..=126). A `Transfer-Encoding`
    /// header also records its codings.
    pub fn parse_header_line(&mut self, line: &str) -> Result<(), ParseError> {
        let (name, rest) = line
            .split_once(':')
            .ok_or_else(|| ParseError::invalid_header(format!("missing ':' in header line {line:?}")))?;

        let rest = rest.trim_start_matches([' ', '\t']);
        let end = rest.bytes().position(|b| !(32..=126).contains(&b)).unwrap_or(rest.len());
        self.set_header(name.trim(), &rest[..end])
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the value of header `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Inserts or replaces header `name`.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidHeader`] if `name` is not a valid header token or
    /// `value` contains bytes a header value may not carry.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_e| ParseError::invalid_header(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_e| ParseError::invalid_header(format!("invalid value for header {name}")))?;

        if name == TRANSFER_ENCODING {
            self.transfer_encodings = value
                .to_str()
                .unwrap_or_default()
                .split(',')
                .filter_map(TransferEncoding::from_token)
                .collect();
        }

        trace!(%name, ?value, "set header");
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        if name == TRANSFER_ENCODING {
            self.transfer_encodings.clear();
        }
        self.headers.remove(name).and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Reads the `Content-Length` header, if present.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidContentLength`] if the value is not a non-negative integer.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(value) = self.headers.get(CONTENT_LENGTH) else {
            return Ok(None);
        };

        let str = value.to_str().map_err(|_e| ParseError::invalid_content_length("value can't to_str"))?;
        let length = str
            .trim()
            .parse::<usize>()
            .map_err(|_e| ParseError::invalid_content_length(format!("value {str} is not usize")))?;
        Ok(Some(length))
    }

    /// Writes every stored header as `name: value\r\n`.
    pub(crate) fn put_headers(&self, dst: &mut BytesMut) {
        for (name, value) in &self.headers {
            put_header(dst, name.as_str(), value.as_bytes());
        }
    }

    /// Writes the body, as a single chunk plus the last chunk when the
    /// message is chunked.
    pub(crate) fn put_body(&self, prefix: &[u8], dst: &mut BytesMut) {
        let len = prefix.len() + self.body.len();
        if self.is_chunked() {
            if len > 0 {
                dst.put_slice(format!("{len:X}\r\n").as_bytes());
                dst.put_slice(prefix);
                dst.put_slice(&self.body);
                dst.put_slice(b"\r\n");
            }
            dst.put_slice(b"0\r\n\r\n");
        } else {
            dst.put_slice(prefix);
            dst.put_slice(&self.body);
        }
    }

    pub fn get_params(&self) -> &BTreeMap<String, String> {
        &self.get_params
    }

    pub fn get_params_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.get_params
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.get_params.get(key).map(String::as_str)
    }

    pub fn set_get_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.get_params.insert(key.into(), value.into());
    }

    pub fn post_params(&self) -> &BTreeMap<String, String> {
        &self.post_params
    }

    pub fn post_params_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.post_params
    }

    pub fn post_param(&self, key: &str) -> Option<&str> {
        self.post_params.get(key).map(String::as_str)
    }

    pub fn set_post_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.post_params.insert(key.into(), value.into());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut BytesMut {
        &mut self.body
    }

    pub fn set_body(&mut self, body: impl AsRef<[u8]>) {
        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
    }

    /// Takes the body out of the message, leaving it empty.
    pub fn take_body(&mut self) -> Bytes {
        self.body.split().freeze()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Sets the request path, prefixing `/` when missing.
    pub fn set_uri(&mut self, uri: impl Into<String>) {
        let uri = uri.into();
        self.uri = if uri.starts_with('/') { uri } else { format!("/{uri}") };
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn set_version(&mut self, version: HttpVersion) {
        self.version = version;
    }

    pub fn transfer_encodings(&self) -> &BTreeSet<TransferEncoding> {
        &self.transfer_encodings
    }

    pub fn is_chunked(&self) -> bool {
        self.transfer_encodings.contains(&TransferEncoding::Chunked)
    }
}

pub(crate) fn put_header(dst: &mut BytesMut, name: &str, value: &[u8]) {
    dst.put_slice(name.as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
}
