use bytes::BytesMut;
use http::header::CONNECTION;
use http::HeaderMap;

use crate::codec::Token;
use crate::protocol::ParseError;
use crate::utils::header_list_contains;

/// Common shape of requests and responses.
///
/// The connection engine fills any `HttpMessage` on reads (headers, body increments,
/// trailers) and only reads from it on writes.
pub trait HttpMessage {
    /// Header fields, names normalized to lowercase.
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Body octets received so far.
    fn body(&self) -> &[u8];

    fn body_mut(&mut self) -> &mut BytesMut;

    /// Trailer fields received after the last chunk.
    fn trailers(&self) -> &HeaderMap;

    fn trailers_mut(&mut self) -> &mut HeaderMap;

    /// Resets the message so it can be reused for the next read cycle.
    fn clear(&mut self);
}

/// Receives the start-line tokens of a message.
pub(crate) trait StartLine: HttpMessage {
    fn apply_start_line(&mut self, token: &Token<'_>) -> Result<(), ParseError>;
}

/// Evaluates whether a connection persists after a message.
///
/// `Connection: close` always wins. Otherwise HTTP/1.1 persists unless told otherwise
/// and HTTP/1.0 persists only with an explicit `Connection: keep-alive`.
pub fn keep_alive(minor_version: u8, headers: &HeaderMap) -> bool {
    let mut close = false;
    let mut keep_alive = false;
    for value in headers.get_all(CONNECTION) {
        close |= header_list_contains(value.as_bytes(), "close");
        keep_alive |= header_list_contains(value.as_bytes(), "keep-alive");
    }

    if close {
        return false;
    }

    minor_version >= 1 || keep_alive
}
