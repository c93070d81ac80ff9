//! Tokenizer for HTTP responses, the client side of a connection.
//!
//! ```text
//! status-line = HTTP-version SP status-code SP [ reason-phrase ] CRLF
//! ```
//!
//! Whether a response has a body depends on the request it answers, so the method of that
//! request has to be set with [`ResponseReader::set_method`] before each response is parsed.
//! Interim (1xx) responses keep the method for the final response that follows them.

use crate::codec::header::BodyType;
use crate::codec::reader::{Mode, ReaderCore, RequestMethod};
use crate::codec::{Code, TokenReader, Tokens};
use crate::protocol::ParseError;
use http::Method;

/// Matches a three digit status code in `100..=999`.
pub(crate) fn match_status_code(rest: &[u8]) -> Result<Option<u16>, ParseError> {
    let digits = &rest[..rest.len().min(3)];
    if !digits.iter().all(u8::is_ascii_digit) || digits.first() == Some(&b'0') {
        return Err(ParseError::InvalidData);
    }
    if digits.len() < 3 {
        return Ok(None);
    }

    Ok(Some(digits.iter().fold(0, |status, b| status * 10 + u16::from(b - b'0'))))
}

/// Incremental reader of HTTP/1.0 and HTTP/1.1 responses.
///
/// An HTTP/1.0 response without `Content-Length` or `Transfer-Encoding` is delimited by the
/// end of the connection; [`puteof`](TokenReader::puteof) ends such a body.
///
/// After a `101 Switching Protocols` response, or a successful response to `CONNECT`, the
/// connection no longer carries HTTP and the reader only yields
/// [`ParseError::UseAnotherConnection`].
#[derive(Debug, Clone)]
pub struct ResponseReader {
    core: ReaderCore,
}

impl ResponseReader {
    pub fn new() -> Self {
        Self { core: ReaderCore::new(Mode::Response) }
    }

    /// Sets the method of the request the next response answers.
    ///
    /// Without it the next status line is a [`ParseError::MethodNotSet`] error.
    pub fn set_method(&mut self, method: &Method) {
        self.core.set_method(RequestMethod::from(method));
    }

    /// Body classification of the current message.
    pub fn body_type(&self) -> BodyType {
        self.core.body_type()
    }
}

impl Default for ResponseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenReader for ResponseReader {
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

    fn puteof(&mut self) {
        self.core.puteof();
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}
