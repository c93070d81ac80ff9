//! HTTP body handling for both directions of a message.
//!
//! # Components
//!
//! ## Reading
//! - [`LengthDecoder`]: remaining-length bookkeeping for `Content-Length` bodies and chunk data
//! - chunk-size and chunk-extension matchers used by the token reader
//! - [`ChunkExtensions`]: decodes raw chunk extensions into name/value pairs
//!
//! ## Writing
//! - [`ChunkedEncoder`]: frames body increments, trailers and the last chunk
//!
//! Bodies framed by `Content-Length` are written verbatim after the head, so they need no
//! encoder of their own.

mod chunk_ext;
mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;

pub use chunk_ext::ChunkExtensions;
pub(crate) use chunked_decoder::{match_chunk_ext, match_chunk_size};
pub use chunked_encoder::{ChunkItem, ChunkedEncoder};
pub(crate) use length_decoder::LengthDecoder;
