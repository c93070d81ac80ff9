//! HTTP header processing for both directions of a message.
//!
//! # Components
//!
//! - field matchers: tokenize `name: value\r\n` lines of headers and trailers
//! - [`BodyType`]: body classification resolved from the framing fields once the header
//!   section is over
//! - [`HeaderEncoder`]: serializes a start-line and header fields
//!   - chooses between `Content-Length` and `Transfer-Encoding: chunked` through [`Framing`]
//!   - adds a `Connection` field when persistence differs from the version default

mod field_decoder;
mod framing;
mod header_encoder;

pub(crate) use field_decoder::{match_field_name, match_field_separator, match_field_value, trimmed_len, FieldKind};
pub use framing::BodyType;
pub(crate) use framing::FramingFields;
pub(crate) use header_encoder::encode_fields;
pub use header_encoder::{FirstLine, Framing, HeaderEncoder, MessageHead};
