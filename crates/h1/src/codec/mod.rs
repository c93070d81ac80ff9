//! Incremental HTTP/1.x tokenizer and the serializers of the write path.
//!
//! This module turns raw bytes into a sequence of typed tokens without copying them, and
//! serializes message heads and chunked bodies for the other direction.
//!
//! # Architecture
//!
//! - Reading:
//!   - [`RequestReader`] / [`ResponseReader`]: resumable state machines implementing
//!     [`TokenReader`]; they keep only the parser state between windows
//!   - [`Tokens`]: cursor over the tokens of one window, yielding [`Code`] and [`Token`]
//!   - header field matching and body classification via the `header` module
//!   - chunked / length-delimited body matching via the `body` module
//!
//! - Writing:
//!   - [`HeaderEncoder`]: start-line and header fields of a [`MessageHead`]
//!   - [`ChunkedEncoder`]: body increments, trailers and the last chunk
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::{Code, RequestReader, Token, TokenReader};
//!
//! let mut reader = RequestReader::new();
//! let mut buffer = b"GET / HTTP/1.1\r\nHo".to_vec();
//!
//! let mut tokens = reader.set_buffer(&mut buffer);
//! while tokens.code() != Code::Insufficient {
//!     tokens.next();
//! }
//! let parsed = tokens.parsed_count();
//!
//! // drop what was committed, append what arrived since
//! buffer.drain(..parsed);
//! buffer.extend_from_slice(b"st: example.com\r\n\r\n");
//!
//! let tokens = reader.set_buffer(&mut buffer);
//! // field names come out lowercased
//! assert_eq!(tokens.token(), Some(Token::FieldName("host")));
//! ```

mod body;
mod header;
mod reader;
mod request_reader;
mod response_reader;
mod syntax;
mod token;

pub use body::{ChunkExtensions, ChunkItem, ChunkedEncoder};
pub use header::{BodyType, FirstLine, Framing, HeaderEncoder, MessageHead};
pub(crate) use header::encode_fields;
pub use reader::{TokenReader, Tokens};
pub use request_reader::RequestReader;
pub use response_reader::ResponseReader;
pub use token::{Code, Token};
