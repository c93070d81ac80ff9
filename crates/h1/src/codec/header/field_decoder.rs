//! Matchers for header and trailer fields.
//!
//! A field line `name: value\r\n` is tokenized as:
//!
//! - the field name (`tchar+`, the colon is not included)
//! - a skip over the colon and leading optional whitespace
//! - the field value up to, not including, the CR; trailing whitespace is excluded from the
//!   value view but counted in the token size
//! - a skip over the CRLF
//!
//! Obsolete line folding and whitespace between the field name and the colon are rejected.

use crate::codec::syntax::{is_field_content, match_token_until, Match};
use crate::protocol::ParseError;
use crate::utils::is_ows;

pub(crate) fn match_field_name(rest: &[u8]) -> Match {
    match rest.first() {
        None => Match::Partial,
        // a line starting with whitespace is obs-fold
        Some(b) if is_ows(*b) => Match::Invalid(ParseError::InvalidData),
        Some(_) => match_token_until(rest, b':'),
    }
}

/// Matches `":" OWS`.
///
/// The whitespace run is only known to be complete once a byte after it is visible.
pub(crate) fn match_field_separator(rest: &[u8]) -> Match {
    match rest.first() {
        None => return Match::Partial,
        Some(b':') => {}
        Some(_) => return Match::Invalid(ParseError::InvalidData),
    }

    match rest[1..].iter().position(|b| !is_ows(*b)) {
        Some(ows) => Match::Complete(1 + ows),
        None => Match::Partial,
    }
}

/// Matches the field value up to the CR ending the line.
pub(crate) fn match_field_value(rest: &[u8]) -> Match {
    for (i, b) in rest.iter().enumerate() {
        if *b == b'\r' {
            return Match::Complete(i);
        }
        if !is_field_content(*b) {
            return Match::Invalid(ParseError::InvalidData);
        }
    }
    Match::Partial
}

/// Length of `value` once trailing whitespace is removed.
pub(crate) fn trimmed_len(value: &[u8]) -> usize {
    value.iter().rposition(|b| !is_ows(*b)).map_or(0, |pos| pos + 1)
}

/// Header fields the reader interprets while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Other,
    Host,
    ContentLength,
    TransferEncoding,
}

impl FieldKind {
    pub(crate) fn of(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"content-length") {
            FieldKind::ContentLength
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            FieldKind::TransferEncoding
        } else if name.eq_ignore_ascii_case(b"host") {
            FieldKind::Host
        } else {
            FieldKind::Other
        }
    }
}
