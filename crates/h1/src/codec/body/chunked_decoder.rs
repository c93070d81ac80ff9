//! Matchers for chunked transfer coding.
//!
//! See [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! ```text
//! chunked-body   = *chunk
//!                  last-chunk
//!                  trailer-section
//!                  CRLF
//! chunk          = chunk-size [ chunk-ext ] CRLF
//!                  chunk-data CRLF
//! chunk-size     = 1*HEXDIG
//! last-chunk     = 1*("0") [ chunk-ext ] CRLF
//! chunk-ext      = *( BWS ";" BWS chunk-ext-name [ BWS "=" BWS chunk-ext-val ] )
//! ```
//!
//! The size line is split into three tokens: the size digits with any trailing whitespace,
//! the raw extensions (when a `;` follows), and the CRLF. Chunk data and the CRLF closing it
//! are matched by the reader with the remaining length of the chunk.

use crate::codec::syntax::{hex_value, is_field_content, Match};
use crate::protocol::ParseError;
use crate::utils::is_ows;

/// A complete `chunk-size` match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSize {
    /// Bytes covered: hex digits plus trailing whitespace.
    pub(crate) len: usize,
    pub(crate) size: u64,
    /// A `;` follows, so chunk extensions come next.
    pub(crate) extensions: bool,
}

/// Matches the hex size of a chunk.
///
/// Returns `Ok(None)` while the window ends before the delimiter following the size is
/// visible: the digits alone do not tell whether more digits are on the way.
pub(crate) fn match_chunk_size(rest: &[u8]) -> Result<Option<ChunkSize>, ParseError> {
    let mut size: u64 = 0;
    let mut digits = 0;

    for b in rest {
        let Some(digit) = hex_value(*b) else {
            break;
        };
        size = size
            .checked_mul(16)
            .and_then(|n| n.checked_add(u64::from(digit)))
            .ok_or(ParseError::ChunkSizeOverflow)?;
        digits += 1;
    }

    if digits == 0 {
        return if rest.is_empty() { Ok(None) } else { Err(ParseError::InvalidChunkSize) };
    }

    let bws = rest[digits..].iter().take_while(|b| is_ows(**b)).count();
    let len = digits + bws;

    match rest.get(len) {
        None => Ok(None),
        Some(b';') => Ok(Some(ChunkSize { len, size, extensions: true })),
        Some(b'\r') => Ok(Some(ChunkSize { len, size, extensions: false })),
        Some(_) => Err(ParseError::InvalidChunkSize),
    }
}

/// Matches the raw chunk extensions, from the first `;` up to the CR ending the size line.
pub(crate) fn match_chunk_ext(rest: &[u8]) -> Match {
    for (i, b) in rest.iter().enumerate() {
        if *b == b'\r' {
            return Match::Complete(i);
        }
        if !is_field_content(*b) {
            return Match::Invalid(ParseError::InvalidChunkSize);
        }
    }
    Match::Partial
}
