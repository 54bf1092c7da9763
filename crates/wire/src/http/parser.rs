//! The incremental engine behind [`HttpRequest`](crate::http::HttpRequest) and
//! [`HttpResponse`](crate::http::HttpResponse).
//!
//! Bytes are accumulated until the header terminator (`\r\n\r\n`, or `\n\n` as
//! a fallback) shows up. The header block is then split into lines, the start
//! line is handed to the caller and every other line goes through
//! [`HttpMessage::parse_header_line`]. Whatever follows the terminator lands in
//! the message body, which is then either collapsed in place chunk by chunk or
//! cut at `Content-Length`.
//!
//! The bare `\n` fallback only applies to the header block. Chunked framing
//! (size lines, data terminators and trailers) must use `\r\n`.

use bytes::{BufMut, BytesMut};
use httparse::Status;
use tracing::{trace, warn};

use crate::config::Limits;
use crate::http::{HttpMessage, ParseError, ParseStatus, split_lines};
use crate::utils::{ensure, erase, find_bytes};

/// Progress of one message through the parser.
///
/// `header_ended` never goes back to `false` once set, and `content_length`
/// only governs the body when the message is not chunked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseState {
    header_ended: bool,
    content_length: usize,
    chunk_offset: usize,
    complete: bool,
}

impl ParseState {
    pub fn header_ended(&self) -> bool {
        self.header_ended
    }

    /// Declared body length, 0 when no `Content-Length` was sent.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// Number of decoded payload bytes at the front of a chunked body.
    pub fn chunk_offset(&self) -> usize {
        self.chunk_offset
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Parser {
    state: ParseState,
    limits: Limits,
    header: BytesMut,
    excess: BytesMut,
}

impl Parser {
    pub(crate) fn new(limits: Limits) -> Self {
        Self { limits, ..Self::default() }
    }

    pub(crate) fn state(&self) -> &ParseState {
        &self.state
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Bytes received past the end of the completed message.
    pub(crate) fn take_excess(&mut self) -> BytesMut {
        self.excess.split()
    }

    /// Feeds `data` into the message.
    ///
    /// `start_line` is called once, with the first header line, when the header
    /// block is complete.
    pub(crate) fn parse<F>(&mut self, message: &mut HttpMessage, data: &[u8], start_line: F) -> Result<ParseStatus, ParseError>
    where
        F: FnOnce(&mut HttpMessage, &str) -> Result<(), ParseError>,
    {
        if self.state.complete {
            self.excess.put_slice(data);
            return Ok(ParseStatus::Complete);
        }

        if self.state.header_ended {
            message.body_mut().put_slice(data);
        } else {
            self.header.put_slice(data);
            let Some((header_len, terminator_len)) = self.find_header_end()? else {
                return Ok(ParseStatus::NotEnoughData);
            };

            self.state.header_ended = true;
            let header = self.header.split_to(header_len + terminator_len);
            let rest = self.header.split();
            self.parse_header(message, &header[..header_len], start_line)?;
            message.body_mut().put_slice(&rest);
        }

        let body_len = message.body().len();
        let max_body_size = self.limits.max_body_size();
        if body_len > max_body_size {
            warn!(body_len, max_body_size, "http body too large");
            return Err(ParseError::too_large_body(body_len, max_body_size));
        }

        let status = if message.is_chunked() { self.poll_chunks(message)? } else { self.poll_length(message) };
        if status.is_complete() {
            self.state.complete = true;
            trace!(body_len = message.body().len(), excess = self.excess.len(), "http message complete");
        }
        Ok(status)
    }

    /// Locates the header terminator, returning the header length and the
    /// terminator length.
    fn find_header_end(&self) -> Result<Option<(usize, usize)>, ParseError> {
        let found = find_bytes(&self.header, b"\r\n\r\n")
            .map(|pos| (pos, 4))
            .or_else(|| find_bytes(&self.header, b"\n\n").map(|pos| (pos, 2)));

        let current_size = found.map_or(self.header.len(), |(pos, _)| pos);
        let max_size = self.limits.max_header_size();
        if current_size > max_size {
            warn!(current_size, max_size, "http header too large");
            return Err(ParseError::too_large_header(current_size, max_size));
        }
        Ok(found)
    }

    fn parse_header<F>(&mut self, message: &mut HttpMessage, header: &[u8], start_line: F) -> Result<(), ParseError>
    where
        F: FnOnce(&mut HttpMessage, &str) -> Result<(), ParseError>,
    {
        let text = std::str::from_utf8(header).map_err(|_e| ParseError::invalid_header("header is not valid utf-8"))?;
        let mut lines = split_lines(text, '\n', true).into_iter();

        start_line(message, lines.next().unwrap_or_default())?;
        for line in lines.filter(|line| !line.is_empty()) {
            message.parse_header_line(line)?;
        }

        if !message.is_chunked() {
            self.state.content_length = message.content_length()?.unwrap_or(0);
            let max_body_size = self.limits.max_body_size();
            ensure!(
                self.state.content_length <= max_body_size,
                ParseError::too_large_body(self.state.content_length, max_body_size)
            );
        }

        trace!(
            header_size = header.len(),
            header_count = message.headers().len(),
            content_length = self.state.content_length,
            chunked = message.is_chunked(),
            "parsed http header"
        );
        Ok(())
    }

    fn poll_length(&mut self, message: &mut HttpMessage) -> ParseStatus {
        let content_length = self.state.content_length;
        let body = message.body_mut();
        if body.len() < content_length {
            return ParseStatus::NotEnoughData;
        }

        self.excess.put(body.split_off(content_length));
        ParseStatus::Complete
    }

    /// Collapses every fully buffered chunk into decoded payload at the front
    /// of the body.
    fn poll_chunks(&mut self, message: &mut HttpMessage) -> Result<ParseStatus, ParseError> {
        let max_body_size = self.limits.max_body_size();
        let body = message.body_mut();

        loop {
            let offset = self.state.chunk_offset;
            let (line_len, size) = match httparse::parse_chunk_size(&body[offset..]) {
                Ok(Status::Complete(parsed)) => parsed,
                Ok(Status::Partial) => return Ok(ParseStatus::NotEnoughData),
                Err(_e) => return Err(ParseError::invalid_chunk("invalid chunk size line")),
            };

            if size == 0 {
                return Ok(self.finish_chunks(body, offset + line_len));
            }

            let size = usize::try_from(size).unwrap_or(usize::MAX);
            let decoded = offset.saturating_add(size);
            if decoded > max_body_size {
                warn!(chunk_size = size, max_body_size, "http chunk too large");
                return Err(ParseError::too_large_body(decoded, max_body_size));
            }

            // leaves room for the CRLF after the data
            let Some(chunk_end) = offset
                .checked_add(line_len)
                .and_then(|end| end.checked_add(size))
                .filter(|end| end.checked_add(2).is_some())
            else {
                warn!(chunk_size = size, "http chunk size overflows");
                return Err(ParseError::too_large_body(usize::MAX, max_body_size));
            };

            if body.len() < chunk_end + 2 {
                return Ok(ParseStatus::NotEnoughData);
            }
            ensure!(&body[chunk_end..chunk_end + 2] == b"\r\n", ParseError::invalid_chunk("chunk data not followed by CRLF"));

            erase(body, chunk_end, chunk_end + 2);
            erase(body, offset, offset + line_len);
            self.state.chunk_offset += size;
            trace!(chunk_size = size, decoded = self.state.chunk_offset, "collapsed http chunk");
        }
    }

    /// Handles the bytes after the last-chunk line: either a bare CRLF or a
    /// trailer section ended by an empty line. Trailers are discarded.
    fn finish_chunks(&mut self, body: &mut BytesMut, trailer_start: usize) -> ParseStatus {
        let trailer = &body[trailer_start..];
        let trailer_end = if trailer.starts_with(b"\r\n") {
            2
        } else if let Some(pos) = find_bytes(trailer, b"\r\n\r\n") {
            pos + 4
        } else {
            return ParseStatus::NotEnoughData;
        };

        let mut rest = body.split_off(self.state.chunk_offset);
        self.excess.put(rest.split_off(trailer_start - self.state.chunk_offset + trailer_end));
        ParseStatus::Complete
    }
}
