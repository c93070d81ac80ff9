//! HTTP response message.

use bytes::BytesMut;
use http::{HeaderMap, StatusCode};

use crate::codec::Token;
use crate::protocol::message::StartLine;
use crate::protocol::{HttpMessage, ParseError};

/// An HTTP response.
///
/// The reason phrase is kept as received, as bytes since it may carry obs-text; when
/// writing, an empty reason phrase is replaced by the canonical one for the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    reason: Vec<u8>,
    headers: HeaderMap,
    body: BytesMut,
    trailers: HeaderMap,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// Creates a response with the canonical reason phrase of `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().as_bytes().to_vec(),
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            trailers: HeaderMap::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn reason_phrase(&self) -> &[u8] {
        &self.reason
    }

    pub fn set_reason_phrase<T: AsRef<[u8]>>(&mut self, reason: T) {
        self.reason.clear();
        self.reason.extend_from_slice(reason.as_ref());
    }

    /// Replaces the body.
    pub fn set_body<B: AsRef<[u8]>>(&mut self, body: B) {
        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
    }

    /// Builder-style variant of `headers_mut().append(..)`.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Builder-style variant of [`set_body`](Self::set_body).
    #[must_use]
    pub fn with_body<B: AsRef<[u8]>>(mut self, body: B) -> Self {
        self.set_body(body);
        self
    }
}

impl HttpMessage for Response {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn body_mut(&mut self) -> &mut BytesMut {
        &mut self.body
    }

    fn trailers(&self) -> &HeaderMap {
        &self.trailers
    }

    fn trailers_mut(&mut self) -> &mut HeaderMap {
        &mut self.trailers
    }

    fn clear(&mut self) {
        self.status = StatusCode::OK;
        self.reason.clear();
        self.headers.clear();
        self.body.clear();
        self.trailers.clear();
    }
}

impl StartLine for Response {
    fn apply_start_line(&mut self, token: &Token<'_>) -> Result<(), ParseError> {
        match token {
            Token::StatusCode(code) => {
                self.status = StatusCode::from_u16(*code).map_err(|_e| ParseError::InvalidData)?;
            }
            Token::ReasonPhrase(reason) => {
                self.reason.clear();
                self.reason.extend_from_slice(reason);
            }
            _ => {}
        }
        Ok(())
    }
}
