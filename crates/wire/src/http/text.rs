//! String primitives shared by the request and response parsers.

/// Splits `s` on every `token` not preceded by a backslash.
///
/// A segment ending in `\` is joined with the next one, backslash kept. With
/// `strip`, surrounding whitespace is trimmed from each segment.
///
/// ```
/// use micro_wire::http::split_lines;
///
/// assert_eq!(split_lines("a\r\nb\\\nc", '\n', true), vec!["a", "b\\\nc"]);
/// ```
pub fn split_lines(s: &str, token: char, strip: bool) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if c == token && !escaped {
            lines.push(&s[start..i]);
            start = i + c.len_utf8();
        }
        escaped = c == '\\';
    }
    lines.push(&s[start..]);

    if strip {
        for line in &mut lines {
            *line = line.trim();
        }
    }
    lines
}

/// Parses `key=value&key=value`, with or without a leading `?`, into ordered
/// pairs. Keys and values are percent-decoded.
///
/// Parsing stops at the first segment without `=`.
pub fn parse_argument_list(s: &str) -> Vec<(String, String)> {
    let s = s.strip_prefix('?').unwrap_or(s);
    let mut arguments = Vec::new();
    if s.is_empty() {
        return arguments;
    }

    for segment in s.split('&') {
        let Some((key, value)) = segment.split_once('=') else {
            break;
        };
        arguments.push((url_decode(key), url_decode(value)));
    }
    arguments
}

/// Builds the `key=value&key=value` form of `arguments`, percent-encoding each part.
pub fn encode_argument_list<'a, I>(arguments: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut encoded = String::new();
    for (key, value) in arguments {
        if !encoded.is_empty() {
            encoded.push('&');
        }
        encoded.push_str(&url_encode(key));
        encoded.push('=');
        encoded.push_str(&url_encode(value));
    }
    encoded
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encodes `s` with uppercase hex digits; space becomes `+`.
///
/// ASCII alphanumerics and `-_.~` pass through unchanged.
pub fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => encoded.push(byte as char),
            b' ' => encoded.push('+'),
            _ => {
                encoded.push('%');
                encoded.push(char::from(HEX[usize::from(byte >> 4)]));
                encoded.push(char::from(HEX[usize::from(byte & 0x0F)]));
            }
        }
    }
    encoded
}

/// Reverses [`url_encode`]: `%XX` becomes the byte it names and `+` a space.
///
/// A `%` not followed by two hex digits is kept literally. Byte sequences that
/// are not UTF-8 decode lossily.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => match (bytes.get(i + 1).and_then(hex_value), bytes.get(i + 2).and_then(hex_value)) {
                (Some(high), Some(low)) => {
                    decoded.push(high << 4 | low);
                    i += 3;
                }
                _ => {
                    decoded.push(b'%');
                    i += 1;
                }
            },
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(b: &u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_lines() {
        assert_eq!(split_lines("a\nb\nc", '\n', false), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n", '\n', false), vec!["a", ""]);
        assert_eq!(split_lines("", '\n', false), vec![""]);
    }

    #[test]
    fn split_strips_carriage_returns() {
        assert_eq!(split_lines("GET / HTTP/1.1\r\nHost:  x \r\n", '\n', true), vec!["GET / HTTP/1.1", "Host:  x", ""]);
        assert_eq!(split_lines(" a ;b", ';', false), vec![" a ", "b"]);
    }

    #[test]
    fn split_respects_escapes() {
        assert_eq!(split_lines("one\\\ntwo\nthree", '\n', false), vec!["one\\\ntwo", "three"]);
        assert_eq!(split_lines("a\\&b&c", '&', false), vec!["a\\&b", "c"]);
    }

    #[test]
    fn arguments_with_and_without_question_mark() {
        let expected = vec![("a".to_string(), "1".to_string()), ("b".to_string(), "two words".to_string())];
        assert_eq!(parse_argument_list("?a=1&b=two+words"), expected);
        assert_eq!(parse_argument_list("a=1&b=two%20words"), expected);
    }

    #[test]
    fn arguments_stop_at_segment_without_equals() {
        let parsed = parse_argument_list("a=1&flag&b=2");
        assert_eq!(parsed, vec![("a".to_string(), "1".to_string())]);
        assert!(parse_argument_list("").is_empty());
        assert!(parse_argument_list("?").is_empty());
    }

    #[test]
    fn arguments_keep_equals_in_value() {
        assert_eq!(parse_argument_list("k=a=b&e="), vec![("k".into(), "a=b".into()), ("e".into(), String::new())]);
    }

    #[test]
    fn encode_uses_uppercase_hex_and_plus() {
        assert_eq!(url_encode("a b/c?d=é"), "a+b%2Fc%3Fd%3D%C3%A9");
        assert_eq!(url_encode("safe-_.~AZ09"), "safe-_.~AZ09");
        assert_eq!(url_encode("\x00\x0f\x7f&"), "%00%0F%7F%26");
    }

    #[test]
    fn decode_reverses_encode() {
        for s in ["hello world", "100% sure & done", "é/ü?", "+plus+"] {
            assert_eq!(url_decode(&url_encode(s)), s);
        }
        assert_eq!(url_decode("%2f%2F"), "//");
    }

    #[test]
    fn decode_keeps_malformed_escapes() {
        assert_eq!(url_decode("50%"), "50%");
        assert_eq!(url_decode("%zz%4"), "%zz%4");
    }

    #[test]
    fn encode_argument_list_joins_pairs() {
        let k1 = "q".to_string();
        let v1 = "a b".to_string();
        let k2 = "x&y".to_string();
        let v2 = "1".to_string();
        assert_eq!(encode_argument_list([(&k1, &v1), (&k2, &v2)]), "q=a+b&x%26y=1");
    }
}
