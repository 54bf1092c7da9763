//! [`tokio_util::codec`] adapters over the incremental HTTP parsers.
//!
//! The decoders hand every readable byte to the in-progress message and give
//! back whatever follows a completed message, so pipelined messages on one
//! stream come out one per `decode` call.

use std::io;
use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::config::Limits;
use crate::http::{HttpParse, HttpRequest, HttpResponse, ParseError, SendError};

/// Shared decode loop for requests and responses.
fn decode_message<M: HttpParse>(
    in_progress: &mut Option<M>,
    new_message: impl FnOnce() -> M,
    src: &mut BytesMut,
) -> Result<Option<M>, ParseError> {
    if src.is_empty() {
        return Ok(None);
    }

    let mut message = in_progress.take().unwrap_or_else(new_message);
    let data = src.split();
    if !message.parse(&data)?.is_complete() {
        *in_progress = Some(message);
        return Ok(None);
    }

    let excess = message.take_excess();
    trace!(excess = excess.len(), "decoded http message");
    src.unsplit(excess);
    Ok(Some(message))
}

fn decode_message_eof<M: HttpParse>(
    in_progress: &mut Option<M>,
    new_message: impl FnOnce() -> M,
    src: &mut BytesMut,
) -> Result<Option<M>, ParseError> {
    match decode_message(in_progress, new_message, src)? {
        Some(message) => Ok(Some(message)),
        None if in_progress.is_none() && src.is_empty() => Ok(None),
        None => {
            in_progress.take();
            Err(ParseError::io(io::Error::new(ErrorKind::UnexpectedEof, "stream ended inside an http message")))
        }
    }
}

/// Decodes a stream of bytes into [`HttpRequest`]s.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    limits: Limits,
    in_progress: Option<HttpRequest>,
}

impl RequestDecoder {
    pub fn new(limits: Limits) -> Self {
        Self { limits, in_progress: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = HttpRequest;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limits = self.limits;
        decode_message(&mut self.in_progress, || HttpRequest::with_limits(limits), src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limits = self.limits;
        decode_message_eof(&mut self.in_progress, || HttpRequest::with_limits(limits), src)
    }
}

/// Decodes a stream of bytes into [`HttpResponse`]s.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
    limits: Limits,
    in_progress: Option<HttpResponse>,
}

impl ResponseDecoder {
    pub fn new(limits: Limits) -> Self {
        Self { limits, in_progress: None }
    }
}

impl Decoder for ResponseDecoder {
    type Item = HttpResponse;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limits = self.limits;
        decode_message(&mut self.in_progress, || HttpResponse::with_limits(limits), src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limits = self.limits;
        decode_message_eof(&mut self.in_progress, || HttpResponse::with_limits(limits), src)
    }
}

/// Writes [`HttpRequest`]s, filling in `Host` from the configured host.
#[derive(Debug, Clone)]
pub struct RequestEncoder {
    host: String,
}

impl RequestEncoder {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Encoder<HttpRequest> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: HttpRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.construct(&self.host));
        Ok(())
    }
}

/// Writes [`HttpResponse`]s.
#[derive(Debug, Clone, Default)]
pub struct ResponseEncoder;

impl Encoder<HttpResponse> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: HttpResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.construct(""));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use futures::{SinkExt, StreamExt};
    use http::StatusCode;
    use indoc::indoc;
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[test]
    fn test_decode_in_pieces() {
        let mut decoder = RequestDecoder::default();
        let mut buf = BytesMut::from("GET /index.html HTTP/1.1\r\nHost: a\r\n");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(b"\r\n");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.uri(), "/index.html");
        assert_eq!(request.header("host"), Some("a"));
    }

    #[test]
    fn test_decode_pipelined() {
        let str = indoc! {r##"
        POST /a HTTP/1.1
        Content-Length: 3

        abcGET /b HTTP/1.1

        "##};

        let mut decoder = RequestDecoder::default();
        let mut buf = BytesMut::from(str);

        let first = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.method(), Method::Post);
        assert_eq!(first.body(), b"abc");
        assert_eq!(&buf[..], b"GET /b HTTP/1.1\n\n");

        let second = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.method(), Method::Get);
        assert_eq!(second.uri(), "/b");
        assert!(buf.is_empty());
        assert!(decoder.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_eof() {
        let mut decoder = ResponseDecoder::default();
        let mut buf = BytesMut::new();
        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());

        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort");
        let result = decoder.decode_eof(&mut buf);
        assert!(matches!(result, Err(ParseError::Io { source }) if source.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_decode_error() {
        let mut decoder = RequestDecoder::new(Limits::default().with_max_header_size(8));
        let mut buf = BytesMut::from("GET /a/long/path HTTP/1.1\r\n");
        assert!(matches!(decoder.decode(&mut buf), Err(ParseError::TooLargeHeader { .. })));
    }

    #[tokio::test]
    async fn test_framed_requests() {
        let input: &[u8] = b"GET /one HTTP/1.1\r\n\r\nPUT /two HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata";
        let mut framed = FramedRead::new(input, RequestDecoder::default());

        let one = framed.next().await.unwrap().unwrap();
        assert_eq!(one.uri(), "/one");

        let two = framed.next().await.unwrap().unwrap();
        assert_eq!(two.method(), Method::Put);
        assert_eq!(two.body(), b"data");

        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_framed_round_trip() {
        let mut response = HttpResponse::with_body(StatusCode::ACCEPTED, "queued");
        response.set_header("X-Job", "42").unwrap();

        let mut framed = FramedWrite::new(Vec::new(), ResponseEncoder);
        framed.send(response).await.unwrap();
        framed.send(HttpResponse::with_body(StatusCode::OK, "")).await.unwrap();
        let written = framed.into_inner();

        let mut framed = FramedRead::new(written.as_slice(), ResponseDecoder::default());
        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);
        assert_eq!(first.header("x-job"), Some("42"));
        assert_eq!(first.body(), b"queued");

        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert!(second.body().is_empty());
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_request_encoder_host() {
        let mut request = HttpRequest::new();
        request.set_method(Method::Delete);
        request.set_uri("/items/9");

        let mut framed = FramedWrite::new(Vec::new(), RequestEncoder::new("api.local"));
        framed.send(request).await.unwrap();

        let written = framed.into_inner();
        let mut parsed = HttpRequest::new();
        assert!(parsed.parse(&written).unwrap().is_complete());
        assert_eq!(parsed.method(), Method::Delete);
        assert_eq!(parsed.header("host"), Some("api.local"));
    }
}
