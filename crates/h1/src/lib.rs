//! An incremental HTTP/1.x tokenizer and an asynchronous connection engine
//!
//! This crate reads and writes HTTP/1.0 and HTTP/1.1 messages over any tokio byte stream.
//! Parsing is split in two layers: a zero-copy token reader that can be fed arbitrarily small
//! windows of bytes, and a connection engine that owns a bounded buffer and turns tokens into
//! owned messages.
//!
//! # Features
//!
//! - Resumable tokenizer, independent of how the input is split
//! - Content-Length, chunked and connection-delimited bodies
//! - Chunk extensions and trailer fields
//! - Keep-alive evaluation and pipelining on both sides
//! - `100 Continue` and streamed (chunked) writes
//! - Bounded memory: a message head that does not fit the buffer is an error, not a reallocation
//!
//! # Example
//!
//! ```no_run
//! use micro_h1::connection::{ReadState, ServerConnection};
//! use micro_h1::protocol::{HttpMessage, Request, Response};
//! use http::StatusCode;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//!
//! #[tokio::main]
//! async fn main() {
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         tokio::spawn(async move {
//!             let mut connection = ServerConnection::new(tcp_stream);
//!             let mut request = Request::default();
//!
//!             loop {
//!                 match connection.read_request(&mut request).await {
//!                     Ok(true) => {}
//!                     Ok(false) => break,
//!                     Err(e) => {
//!                         error!(cause = %e, "read request failed");
//!                         break;
//!                     }
//!                 }
//!                 while connection.read_state() == ReadState::MessageReady {
//!                     if connection.read_some(&mut request).await.is_err() {
//!                         return;
//!                     }
//!                 }
//!                 if connection.read_trailers(&mut request).await.is_err() {
//!                     return;
//!                 }
//!                 info!(request_target = request.target(), body_size = request.body().len(), "received request");
//!
//!                 let response = Response::new(StatusCode::OK).with_body("Hello World!\r\n");
//!                 if connection.write_response(&response).await.is_err() || !connection.keep_alive() {
//!                     break;
//!                 }
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: token reader ([`codec::RequestReader`], [`codec::ResponseReader`]) and the
//!   encoders of the write path
//! - [`protocol`]: messages, keep-alive evaluation and errors
//! - [`connection`]: the engine, [`connection::ServerConnection`] and
//!   [`connection::ClientConnection`]
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: everything an engine operation can fail with
//! - [`protocol::ParseError`]: malformed input, as reported by the token reader
//!
//! # Limitations
//!
//! - HTTP/1.x only, no HTTP/2 or HTTP/3
//! - No TLS, wrap the stream before handing it to the engine
//! - No timeouts, they belong to the code owning the connection

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
pub use utils::{header_list_contains, header_list_elements};
