use std::fmt;

/// Request method, or the kind of message when no method applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// No method known: a fresh message, a response, or an unsupported token
    #[default]
    Unknown,
    /// A request whose header block is still arriving
    Partial,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Unknown => "UNKNOWN",
            Method::Partial => "PARTIAL",
        }
    }
}

/// Method tokens are case-sensitive; anything unrecognized maps to `Unknown`.
impl From<&str> for Method {
    fn from(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            _ => Self::Unknown,
        }
    }
}

impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        Self::from(method.as_str())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from() {
        assert_eq!(Method::from("GET"), Method::Get);
        assert_eq!(Method::from("PATCH"), Method::Patch);
        assert_eq!(Method::from(&http::Method::DELETE), Method::Delete);
    }

    #[test]
    fn test_method_from_unknown() {
        assert_eq!(Method::from("get"), Method::Unknown);
        assert_eq!(Method::from(""), Method::Unknown);
        assert_eq!(Method::from("OPTIONS"), Method::Unknown);
    }

    #[test]
    fn test_as_str_round_trips() {
        for method in [Method::Get, Method::Post, Method::Put, Method::Delete, Method::Patch] {
            assert_eq!(Method::from(method.as_str()), method);
        }
        assert_eq!(Method::default(), Method::Unknown);
    }
}
