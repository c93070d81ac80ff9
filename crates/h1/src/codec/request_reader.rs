//! Tokenizer for HTTP requests, the server side of a connection.
//!
//! ```text
//! request-line = method SP request-target SP HTTP-version CRLF
//! ```
//!
//! Empty lines before a request-line are skipped. An HTTP/1.1 request must carry a `Host`
//! field, and a request without `Content-Length` or `Transfer-Encoding` has no body.

use crate::codec::header::BodyType;
use crate::codec::reader::{Mode, ReaderCore};
use crate::codec::syntax::{is_obs_text, is_vchar, Match};
use crate::codec::{Code, TokenReader, Tokens};
use crate::protocol::ParseError;

/// Matches a request-target: visible characters up to the SP preceding the version.
pub(crate) fn match_request_target(rest: &[u8]) -> Match {
    for (i, b) in rest.iter().enumerate() {
        if *b == b' ' {
            return if i == 0 { Match::Invalid(ParseError::InvalidData) } else { Match::Complete(i) };
        }
        if !is_vchar(*b) || is_obs_text(*b) {
            return Match::Invalid(ParseError::InvalidData);
        }
    }
    Match::Partial
}

/// Incremental reader of HTTP/1.0 and HTTP/1.1 requests.
///
/// # Example
///
/// ```
/// use micro_h1::codec::{Code, RequestReader, Token, TokenReader};
///
/// let mut reader = RequestReader::new();
/// let mut window = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec();
/// let mut tokens = reader.set_buffer(&mut window);
///
/// assert_eq!(tokens.token(), Some(Token::Method("GET")));
/// tokens.next();
/// assert_eq!(tokens.code(), Code::Skip);
/// tokens.next();
/// assert_eq!(tokens.token(), Some(Token::RequestTarget("/index.html")));
/// ```
#[derive(Debug, Clone)]
pub struct RequestReader {
    core: ReaderCore,
}

impl RequestReader {
    pub fn new() -> Self {
        Self { core: ReaderCore::new(Mode::Request) }
    }

    /// Body classification of the current message.
    pub fn body_type(&self) -> BodyType {
        self.core.body_type()
    }
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenReader for RequestReader {
    fn set_buffer<'r, 'w>(&'r mut self, window: &'w mut [u8]) -> Tokens<'r, 'w> {
        Tokens::new(&mut self.core, window)
    }

    fn code(&self) -> Code {
        self.core.code()
    }

    fn expected_token(&self) -> Code {
        self.core.expected_token()
    }

    fn is_message_start(&self) -> bool {
        self.core.is_message_start()
    }

    /// Requests are never delimited by the end of the stream.
    fn puteof(&mut self) {}

    fn reset(&mut self) {
        self.core.reset();
    }
}
