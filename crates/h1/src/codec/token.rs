//! Token kinds and typed token values.

use crate::protocol::ParseError;

/// The kind of the current token.
///
/// `Insufficient` and `Error` are not tokens themselves: the former means the window ran
/// out before the token completed, the latter is terminal for the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Insufficient,
    Error(ParseError),
    /// Bytes with no value for the caller (separators, CRLFs, chunk-size lines).
    Skip,
    Method,
    RequestTarget,
    Version,
    StatusCode,
    ReasonPhrase,
    FieldName,
    FieldValue,
    EndOfHeaders,
    ChunkExt,
    BodyChunk,
    EndOfBody,
    TrailerName,
    TrailerValue,
    EndOfMessage,
}

impl Code {
    /// Returns true if this code is a fatal parsing error.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Code::Error(_))
    }

    /// Returns the parsing error, if any.
    #[inline]
    pub fn error(self) -> Option<ParseError> {
        match self {
            Code::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// A complete token together with its value.
///
/// Data-bearing variants borrow from the window the token was matched in, so they cannot
/// outlive it: the window has to stay untouched for as long as a token is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'w> {
    Skip,
    Method(&'w str),
    RequestTarget(&'w str),
    /// Minor version of `HTTP/1.x`.
    Version(u8),
    StatusCode(u16),
    ReasonPhrase(&'w [u8]),
    /// Field name, lowercased.
    FieldName(&'w str),
    /// Field value without surrounding whitespace.
    FieldValue(&'w [u8]),
    EndOfHeaders,
    /// Raw chunk extensions, starting at the first `;`.
    ChunkExt(&'w [u8]),
    BodyChunk(&'w [u8]),
    EndOfBody,
    /// Trailer field name, lowercased.
    TrailerName(&'w str),
    TrailerValue(&'w [u8]),
    EndOfMessage,
}

impl Token<'_> {
    /// The kind of this token.
    pub fn code(&self) -> Code {
        match self {
            Token::Skip => Code::Skip,
            Token::Method(_) => Code::Method,
            Token::RequestTarget(_) => Code::RequestTarget,
            Token::Version(_) => Code::Version,
            Token::StatusCode(_) => Code::StatusCode,
            Token::ReasonPhrase(_) => Code::ReasonPhrase,
            Token::FieldName(_) => Code::FieldName,
            Token::FieldValue(_) => Code::FieldValue,
            Token::EndOfHeaders => Code::EndOfHeaders,
            Token::ChunkExt(_) => Code::ChunkExt,
            Token::BodyChunk(_) => Code::BodyChunk,
            Token::EndOfBody => Code::EndOfBody,
            Token::TrailerName(_) => Code::TrailerName,
            Token::TrailerValue(_) => Code::TrailerValue,
            Token::EndOfMessage => Code::EndOfMessage,
        }
    }
}
