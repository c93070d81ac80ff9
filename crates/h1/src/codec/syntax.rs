//! Byte classes of the HTTP/1.x grammar and the result type shared by the matchers.

use crate::protocol::ParseError;

/// Outcome of matching one token at the start of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Match {
    /// The token is complete and spans this many bytes.
    Complete(usize),
    /// The window ended before the token did.
    Partial,
    Invalid(ParseError),
}

/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~"
///       / DIGIT / ALPHA
#[inline]
pub(crate) fn is_tchar(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
    ) || b.is_ascii_alphanumeric()
}

#[inline]
pub(crate) fn is_vchar(b: u8) -> bool {
    (0x21..=0x7e).contains(&b)
}

#[inline]
pub(crate) fn is_obs_text(b: u8) -> bool {
    b >= 0x80
}

/// Bytes allowed inside a field value or a reason phrase.
#[inline]
pub(crate) fn is_field_content(b: u8) -> bool {
    is_vchar(b) || is_obs_text(b) || b == b' ' || b == b'\t'
}

#[inline]
pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Matches a CRLF at the start of `rest`.
pub(crate) fn match_crlf(rest: &[u8]) -> Match {
    match rest {
        [] | [b'\r'] => Match::Partial,
        [b'\r', b'\n', ..] => Match::Complete(2),
        _ => Match::Invalid(ParseError::InvalidData),
    }
}

/// Matches a single SP.
pub(crate) fn match_sp(rest: &[u8]) -> Match {
    match rest.first() {
        None => Match::Partial,
        Some(b' ') => Match::Complete(1),
        Some(_) => Match::Invalid(ParseError::InvalidData),
    }
}

/// Matches `HTTP/1.0` or `HTTP/1.1`, returning the minor version.
///
/// A window that already diverges from the `HTTP/1.` prefix fails without waiting for
/// more bytes.
pub(crate) fn match_http_version(rest: &[u8]) -> Result<Option<u8>, ParseError> {
    const PREFIX: &[u8] = b"HTTP/1.";

    let n = rest.len().min(PREFIX.len());
    if rest[..n] != PREFIX[..n] {
        return Err(ParseError::InvalidData);
    }

    match rest.get(PREFIX.len()) {
        None => Ok(None),
        Some(b'0') => Ok(Some(0)),
        Some(b'1') => Ok(Some(1)),
        Some(_) => Err(ParseError::InvalidData),
    }
}

/// Length of an `HTTP/1.x` version token.
pub(crate) const VERSION_LEN: usize = 8;

/// Matches `tchar+` terminated by `delimiter`; the delimiter is not part of the match.
pub(crate) fn match_token_until(rest: &[u8], delimiter: u8) -> Match {
    for (i, b) in rest.iter().enumerate() {
        if *b == delimiter {
            return if i == 0 { Match::Invalid(ParseError::InvalidData) } else { Match::Complete(i) };
        }
        if !is_tchar(*b) {
            return Match::Invalid(ParseError::InvalidData);
        }
    }
    Match::Partial
}
