//! Bookkeeping for bodies of known length.
//!
//! Used for `Content-Length` bodies, as defined in
//! [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3), and for the data
//! of each chunk of a chunked body.

use std::cmp;

/// Tracks the bytes still expected from a length-delimited body or chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    pub(crate) fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Size of the next body chunk when `available` bytes are in the window.
    pub(crate) fn next_chunk(&self, available: usize) -> usize {
        // anything above usize::MAX is larger than the window anyway
        usize::try_from(self.remaining).map_or(available, |remaining| cmp::min(remaining, available))
    }

    pub(crate) fn consume(&mut self, n: usize) {
        self.remaining = self.remaining.saturating_sub(n as u64);
    }
}
