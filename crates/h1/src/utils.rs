//! Utility macros and functions for the HTTP/1.x engine.
//!
//! This module provides helper macros and functions that are used internally
//! by the tokenizer and the connection engine.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's useful for validation checks where you want to return early with an error
/// if some condition is not satisfied.
///
/// # Arguments
///
/// * `$predicate` - A boolean expression that should evaluate to true
/// * `$error` - The error value to return if the predicate is false
///
/// # Example
///
/// ```ignore
/// ensure!(self.write_state == WriteState::MetadataIssued, HttpError::OutOfOrder);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error.into());
        }
    };
}

pub(crate) use ensure;

/// Iterates the elements of a comma-separated header value list.
///
/// Each element is trimmed of surrounding optional whitespace (SP / HTAB) and empty
/// elements are skipped, so `" , a ,, b\t,"` visits `a` then `b`.
///
/// Quoted strings are not interpreted; a comma inside a quoted string splits the element.
pub fn header_list_elements(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value.split(|b| *b == b',').map(trim_ows).filter(|element| !element.is_empty())
}

/// Returns true if any list element of `value` equals `token`, ignoring ASCII case.
pub fn header_list_contains(value: &[u8], token: &str) -> bool {
    header_list_elements(value).any(|element| element.eq_ignore_ascii_case(token.as_bytes()))
}

/// Strips leading and trailing SP / HTAB.
pub(crate) fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !is_ows(*b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_ows(*b)).map_or(start, |pos| pos + 1);
    &bytes[start..end]
}

#[inline]
pub(crate) fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
