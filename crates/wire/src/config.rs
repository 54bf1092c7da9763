//! Size limits applied by the HTTP parsers.
//!
//! Both limits guard against resource exhaustion from a peer that never
//! terminates its header block or declares an unbounded body.

/// Maximum size in bytes of the header block, terminator included
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// Maximum size in bytes of an accumulated body
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Limits enforced by [`HttpRequest`](crate::http::HttpRequest) and
/// [`HttpResponse`](crate::http::HttpResponse) while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    max_header_size: usize,
    max_body_size: usize,
}

impl Limits {
    pub const fn new(max_header_size: usize, max_body_size: usize) -> Self {
        Self { max_header_size, max_body_size }
    }

    #[must_use]
    pub const fn with_max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    #[must_use]
    pub const fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub const fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub const fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(MAX_HEADER_SIZE, MAX_BODY_SIZE)
    }
}
