//! HTTP request message.
//!
//! A [`Request`] owns everything the engine reads or writes for one request:
//! method and request-target, the header multimap, the body octets and the trailers.

use bytes::BytesMut;
use http::header::EXPECT;
use http::{HeaderMap, Method};

use crate::codec::Token;
use crate::protocol::message::StartLine;
use crate::protocol::{HttpMessage, ParseError};
use crate::utils::header_list_contains;

/// An HTTP request.
///
/// On reads the connection engine clears the request and then fills it in place, so a
/// single `Request` can be reused across the requests of a persistent connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: BytesMut,
    trailers: HeaderMap,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl Request {
    pub fn new<T: Into<String>>(method: Method, target: T) -> Self {
        Self { method, target: target.into(), headers: HeaderMap::new(), body: BytesMut::new(), trailers: HeaderMap::new() }
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Returns the request-target exactly as it appeared on the request-line.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target<T: Into<String>>(&mut self, target: T) {
        self.target = target.into();
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

    /// Determines if this request usually carries a body based on its HTTP method.
    ///
    /// Returns false for methods that typically don't have bodies:
    /// - GET
    /// - HEAD
    /// - DELETE
    /// - OPTIONS
    /// - CONNECT
    /// - TRACE
    pub fn need_body(&self) -> bool {
        !matches!(
            self.method(),
            &Method::GET | &Method::HEAD | &Method::DELETE | &Method::OPTIONS | &Method::CONNECT | &Method::TRACE
        )
    }

    /// Returns true if the client asked for an interim `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.headers.get_all(EXPECT).iter().any(|value| header_list_contains(value.as_bytes(), "100-continue"))
    }
}

impl HttpMessage for Request {
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
        self.method = Method::GET;
        self.target.clear();
        self.headers.clear();
        self.body.clear();
        self.trailers.clear();
    }
}

impl StartLine for Request {
    fn apply_start_line(&mut self, token: &Token<'_>) -> Result<(), ParseError> {
        match token {
            Token::Method(method) => {
                self.method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidData)?;
            }
            Token::RequestTarget(target) => {
                self.target.clear();
                self.target.push_str(target);
            }
            _ => {}
        }
        Ok(())
    }
}
