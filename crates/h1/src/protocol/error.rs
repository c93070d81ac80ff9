use std::io;
use thiserror::Error;

use crate::codec::Code;

/// Errors reported by the connection engine.
///
/// The variants fall into four groups:
///
/// - usage errors ([`OutOfOrder`](HttpError::OutOfOrder),
///   [`NativeStreamUnsupported`](HttpError::NativeStreamUnsupported),
///   [`StreamFinished`](HttpError::StreamFinished)): no byte was read or written
/// - resource errors ([`BufferExhausted`](HttpError::BufferExhausted))
/// - wire errors ([`Parse`](HttpError::Parse)): the channel has been closed
/// - channel errors ([`Io`](HttpError::Io)): propagated from the underlying stream
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("operation issued out of order")]
    OutOfOrder,

    #[error("peer does not support native streaming (chunked transfer coding)")]
    NativeStreamUnsupported,

    #[error("stream finished, connection will not persist")]
    StreamFinished,

    #[error("buffer exhausted while expecting {expected:?}")]
    BufferExhausted { expected: Code },

    #[error("parsing error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl HttpError {
    pub fn buffer_exhausted(expected: Code) -> Self {
        Self::BufferExhausted { expected }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true for errors caused by calling an operation illegal in the current state.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::OutOfOrder | Self::NativeStreamUnsupported | Self::StreamFinished)
    }

    /// Returns true for malformed wire data.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns the wire error kind, if this is a parsing error.
    pub fn parse_error(&self) -> Option<ParseError> {
        match self {
            Self::Parse { source } => Some(*source),
            _ => None,
        }
    }
}

/// The closed set of fatal tokenizer errors.
///
/// Each one is terminal for the message being parsed. The last two are structural
/// and only produced by the response reader.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseError {
    #[error("invalid data")]
    InvalidData,

    #[error("missing host header")]
    NoHost,

    #[error("invalid content-length")]
    InvalidContentLength,

    #[error("content-length overflow")]
    ContentLengthOverflow,

    #[error("invalid chunk size")]
    InvalidChunkSize,

    #[error("chunk size overflow")]
    ChunkSizeOverflow,

    #[error("invalid transfer-encoding")]
    InvalidTransferEncoding,

    #[error("request method not set before parsing the response")]
    MethodNotSet,

    #[error("connection upgraded, use another connection")]
    UseAnotherConnection,
}
