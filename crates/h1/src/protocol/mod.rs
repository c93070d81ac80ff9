//! Message types and error vocabulary of the engine.
//!
//! # Components
//!
//! - **Messages** ([`Request`], [`Response`]): start-line, header multimap, body octets and
//!   trailer multimap, all owned by the caller. The shared [`HttpMessage`] trait is what the
//!   connection engine writes into on reads.
//! - **Keep-alive** ([`keep_alive`]): persistence evaluation from version and `Connection`.
//! - **Errors** ([`HttpError`], [`ParseError`]): the caller-visible error conditions.

mod message;
pub use message::keep_alive;
pub use message::HttpMessage;
pub(crate) use message::StartLine;

mod request;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::HttpError;
pub use error::ParseError;
