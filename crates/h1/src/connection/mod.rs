//! The HTTP/1.x connection engine.
//!
//! [`HttpConnection`] drives a [`RequestReader`](crate::codec::RequestReader) or a
//! [`ResponseReader`](crate::codec::ResponseReader) over an asynchronous byte stream and
//! turns its tokens into [`Request`](crate::protocol::Request) and
//! [`Response`](crate::protocol::Response) values, and serializes messages the other way.
//!
//! # Components
//!
//! - [`ServerConnection`]: reads requests, writes responses
//!   - `100 Continue` for requests expecting it
//!   - implicit framing for `HEAD`, `CONNECT` and bodiless statuses
//! - [`ClientConnection`]: writes requests, reads responses
//!   - pipelining, responses are matched with requests in order
//!   - HTTP/1.0 bodies delimited by the end of the stream
//! - [`MessageReader`] / [`MessageWriter`]: the two halves of a connection, for a read and a
//!   write outstanding at the same time
//! - [`ReadState`] / [`WriteState`]: where each direction of the current exchange stands
//!
//! # Example
//!
//! ```no_run
//! use micro_h1::connection::ServerConnection;
//! use micro_h1::protocol::{HttpError, HttpMessage, Request, Response};
//! use micro_h1::connection::ReadState;
//! use http::StatusCode;
//! use tokio::net::TcpStream;
//!
//! async fn serve(stream: TcpStream) -> Result<(), HttpError> {
//!     let mut connection = ServerConnection::new(stream);
//!     let mut request = Request::default();
//!
//!     while connection.read_request(&mut request).await? {
//!         while connection.read_state() == ReadState::MessageReady {
//!             connection.read_some(&mut request).await?;
//!         }
//!         connection.read_trailers(&mut request).await?;
//!
//!         let response = Response::new(StatusCode::OK).with_body(request.body());
//!         connection.write_response(&response).await?;
//!         if !connection.keep_alive() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod http_connection;
mod message_reader;
mod message_writer;
mod state;

pub use http_connection::{ClientConnection, HttpConnection, ServerConnection, DEFAULT_BUFFER_SIZE};
pub use message_reader::MessageReader;
pub use message_writer::MessageWriter;
pub use state::{ReadState, WriteState};

#[cfg(test)]
mod mock_stream;
