//! The write half of [`HttpConnection`](crate::connection::HttpConnection).
//!
//! Complete messages are serialized into the write buffer and sent together with the body
//! in one gather write. Streamed messages send their head first and are then continued with
//! chunks until the last chunk ends them.

use std::marker::PhantomData;

use bytes::{Buf, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::{debug, trace, warn};

use crate::codec::{
    ChunkItem, ChunkedEncoder, FirstLine, Framing, HeaderEncoder, MessageHead, RequestReader, ResponseReader,
};
use crate::connection::state::{Shared, SharedState};
use crate::connection::{ReadState, WriteState};
use crate::ensure;
use crate::protocol::{keep_alive, HttpError, HttpMessage, Request, Response};

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

fn declares_framing(headers: &HeaderMap) -> bool {
    headers.contains_key(CONTENT_LENGTH) || headers.contains_key(TRANSFER_ENCODING)
}

/// A `Connection` field is only written when persistence differs from the version default.
fn connection_field(peer_version: u8, keep_alive: bool) -> Option<&'static str> {
    match (peer_version, keep_alive) {
        (0, true) => Some("keep-alive"),
        (1.., false) => Some("close"),
        _ => None,
    }
}

/// Statuses that never carry a body, whatever the headers say.
fn body_forbidden(status: StatusCode, request_method: &Method) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
        || (request_method == Method::CONNECT && status.is_success())
}

fn is_interim(status: StatusCode) -> bool {
    status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS
}

/// The stream stops carrying HTTP after these responses.
fn is_upgrade(status: StatusCode, request_method: &Method) -> bool {
    status == StatusCode::SWITCHING_PROTOCOLS || (request_method == Method::CONNECT && status.is_success())
}

/// The connection persists only if the request was read and both sides agree.
fn response_keep_alive(shared: &Shared, response: &Response) -> bool {
    shared.read_state != ReadState::Empty && shared.keep_alive && keep_alive(1, response.headers())
}

/// The write buffer and the encoders of a connection.
#[derive(Debug)]
pub(crate) struct Output {
    write_buffer: BytesMut,
    header_encoder: HeaderEncoder,
    chunked_encoder: ChunkedEncoder,
    /// Body increments of the current metadata write are dropped.
    suppress_body: bool,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            write_buffer: BytesMut::new(),
            header_encoder: HeaderEncoder,
            chunked_encoder: ChunkedEncoder::new(),
            suppress_body: false,
        }
    }
}

/// Writes messages to a connection.
///
/// [`HttpConnection::split`](crate::connection::HttpConnection::split) hands one out
/// together with the [`MessageReader`](crate::connection::MessageReader) of the same
/// connection. [`HttpConnection`](crate::connection::HttpConnection) offers the same
/// operations directly.
///
/// # Type Parameters
///
/// * `Io`: The writable side of the stream
/// * `R`: The token reader of the connection, it decides which messages are written
#[derive(Debug)]
pub struct MessageWriter<'a, Io, R> {
    io: Io,
    output: &'a mut Output,
    shared: &'a SharedState,
    reader: PhantomData<fn() -> R>,
}

impl<'a, Io, R> MessageWriter<'a, Io, R> {
    pub(crate) fn new(io: Io, output: &'a mut Output, shared: &'a SharedState) -> Self {
        Self { io, output, shared, reader: PhantomData }
    }

    #[inline]
    pub fn write_state(&self) -> WriteState {
        self.shared.lock().write_state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    /// Whether the connection persists after the current exchange.
    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.shared.lock().keep_alive
    }

    fn io_failed(&mut self, e: std::io::Error) -> HttpError {
        warn!(cause = %e, "connection failed, closing it");
        self.output.write_buffer.clear();
        self.shared.lock().mark_closed();
        HttpError::io(e)
    }

    /// Prepares a streamed body after its head was sent.
    fn start_streaming(&mut self, suppress_body: bool) {
        self.output.suppress_body = suppress_body;
        self.output.chunked_encoder.reset();
        self.shared.lock().write_state = WriteState::MetadataIssued;
    }

    fn finish_write(&mut self) {
        self.output.suppress_body = false;

        let mut shared = self.shared.lock();
        shared.write_state = WriteState::Finished;
        if !shared.keep_alive {
            debug!("connection will not persist, stream finished");
            shared.stream_finished = true;
        }
        shared.settle();
    }

    /// Serializes a head into the write buffer; nothing is kept when it cannot be encoded.
    fn encode_head(&mut self, head: MessageHead<'_>) -> Result<(), HttpError> {
        if let Err(e) = self.output.header_encoder.encode(head, &mut self.output.write_buffer) {
            self.output.write_buffer.clear();
            return Err(HttpError::io(e));
        }
        Ok(())
    }
}

impl<Io, R> MessageWriter<'_, Io, R>
where
    Io: AsyncWrite + Unpin,
{
    /// Shuts the stream down if a malformed message closed the connection.
    pub(crate) async fn shutdown_if_pending(&mut self) {
        let pending = std::mem::take(&mut self.shared.lock().shutdown_pending);
        if pending {
            if let Err(e) = self.io.shutdown().await {
                debug!(cause = %e, "shutdown after malformed message failed");
            }
        }
    }

    async fn ensure_open(&mut self) -> Result<(), HttpError> {
        self.shutdown_if_pending().await;
        self.shared.lock().ensure_open()
    }

    async fn ensure_writable(&mut self) -> Result<(), HttpError> {
        self.ensure_open().await?;
        ensure!(!self.shared.lock().stream_finished, HttpError::StreamFinished);
        Ok(())
    }

    async fn ensure_streaming(&mut self) -> Result<(), HttpError> {
        self.ensure_open().await?;
        ensure!(self.write_state() == WriteState::MetadataIssued, HttpError::OutOfOrder);
        Ok(())
    }

    /// Sends the write buffer followed by `body` and flushes the stream.
    async fn send(&mut self, body: &[u8]) -> Result<(), HttpError> {
        let mut data = (&self.output.write_buffer[..]).chain(body);
        let result = match self.io.write_all_buf(&mut data).await {
            Ok(()) => self.io.flush().await,
            Err(e) => Err(e),
        };

        self.output.write_buffer.clear();
        result.map_err(|e| self.io_failed(e))
    }

    /// Writes the next increment of a streamed body as one chunk.
    ///
    /// Empty increments are not written.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), HttpError> {
        self.ensure_streaming().await?;

        if self.output.suppress_body || data.is_empty() {
            return Ok(());
        }

        trace!(size = data.len(), "writing chunk");
        self.output.chunked_encoder.encode(ChunkItem::Data(data), &mut self.output.write_buffer)?;
        self.send(&[]).await
    }

    /// Ends a streamed body with the last chunk followed by `trailers`.
    pub async fn write_trailers(&mut self, trailers: &HeaderMap) -> Result<(), HttpError> {
        self.ensure_streaming().await?;

        if !self.output.suppress_body {
            self.output.chunked_encoder.encode(ChunkItem::Trailers(trailers), &mut self.output.write_buffer)?;
            self.send(&[]).await?;
        }
        self.finish_write();
        Ok(())
    }

    /// Ends a streamed body with the last chunk.
    pub async fn write_end_of_message(&mut self) -> Result<(), HttpError> {
        self.ensure_streaming().await?;

        if !self.output.suppress_body {
            self.output.chunked_encoder.encode(ChunkItem::Eof, &mut self.output.write_buffer)?;
            self.send(&[]).await?;
        }
        self.finish_write();
        Ok(())
    }

    /// Shuts the write half of the stream down and marks the connection closed.
    ///
    /// Every operation but [`open`](crate::connection::HttpConnection::open) fails with
    /// `NotConnected` afterwards.
    pub async fn close(&mut self) -> Result<(), HttpError> {
        self.ensure_open().await?;
        debug!("closing connection");
        let result = self.io.shutdown().await;
        self.shared.lock().mark_closed();
        result.map_err(HttpError::io)
    }
}

impl<Io> MessageWriter<'_, Io, RequestReader>
where
    Io: AsyncWrite + Unpin,
{
    /// Writes a complete response: status-line, header fields, framing and body.
    ///
    /// `Content-Length` is added unless the headers already declare framing. No body is
    /// sent for responses to `HEAD` or for statuses that forbid one, and those statuses get
    /// no framing field either. Interim (1xx) responses other than `101` leave the write
    /// state untouched so the final response can follow.
    pub async fn write_response(&mut self, response: &Response) -> Result<(), HttpError> {
        self.ensure_writable().await?;
        let (request_method, peer_version, keep_alive) = {
            let shared = self.shared.lock();
            ensure!(
                matches!(shared.write_state, WriteState::Empty | WriteState::ContinueIssued),
                HttpError::OutOfOrder
            );
            (shared.request_method.clone(), shared.peer_version, response_keep_alive(&shared, response))
        };

        let status = response.status();
        let forbidden = body_forbidden(status, &request_method);
        let interim = is_interim(status);

        let framing = if declares_framing(response.headers()) {
            Framing::AsIs
        } else if forbidden {
            Framing::Implicit
        } else {
            Framing::Length(response.body().len() as u64)
        };
        let body = if forbidden || request_method == Method::HEAD { &[][..] } else { response.body() };

        let head = MessageHead {
            first_line: FirstLine::Response { status, reason: response.reason_phrase() },
            headers: response.headers(),
            framing,
            connection: if interim { None } else { connection_field(peer_version, keep_alive) },
        };
        self.encode_head(head)?;
        self.send(body).await?;
        debug!(status = status.as_u16(), body_size = body.len(), keep_alive, "sent response");

        if interim {
            return Ok(());
        }

        self.shared.lock().keep_alive = keep_alive && !is_upgrade(status, &request_method);
        self.finish_write();
        Ok(())
    }

    /// Writes the status-line and header fields of a response whose body follows in chunks.
    ///
    /// Fails with [`HttpError::NativeStreamUnsupported`] when the peer speaks HTTP/1.0.
    pub async fn write_response_metadata(&mut self, response: &Response) -> Result<(), HttpError> {
        self.ensure_writable().await?;
        let (request_method, peer_version, keep_alive) = {
            let shared = self.shared.lock();
            ensure!(
                matches!(shared.write_state, WriteState::Empty | WriteState::ContinueIssued),
                HttpError::OutOfOrder
            );
            ensure!(shared.peer_version >= 1, HttpError::NativeStreamUnsupported);
            (shared.request_method.clone(), shared.peer_version, response_keep_alive(&shared, response))
        };

        let status = response.status();
        let forbidden = body_forbidden(status, &request_method);

        let head = MessageHead {
            first_line: FirstLine::Response { status, reason: response.reason_phrase() },
            headers: response.headers(),
            framing: if forbidden { Framing::Implicit } else { Framing::Chunked },
            connection: connection_field(peer_version, keep_alive),
        };
        self.encode_head(head)?;
        self.send(&[]).await?;
        debug!(status = status.as_u16(), keep_alive, "sent response head");

        self.shared.lock().keep_alive = keep_alive && !is_upgrade(status, &request_method);
        self.start_streaming(forbidden || request_method == Method::HEAD);
        Ok(())
    }

    /// Writes `HTTP/1.1 100 Continue`, telling the client to go on with the request body.
    ///
    /// Only legal before anything else was written for the current request.
    pub async fn write_response_continue(&mut self) -> Result<(), HttpError> {
        self.ensure_writable().await?;
        {
            let shared = self.shared.lock();
            ensure!(shared.write_state == WriteState::Empty, HttpError::OutOfOrder);
            ensure!(shared.peer_version >= 1, HttpError::NativeStreamUnsupported);
        }

        self.output.write_buffer.extend_from_slice(CONTINUE);
        self.send(&[]).await?;
        trace!("sent 100 continue");

        self.shared.lock().write_state = WriteState::ContinueIssued;
        Ok(())
    }
}

impl<Io> MessageWriter<'_, Io, ResponseReader>
where
    Io: AsyncWrite + Unpin,
{
    /// Writes a complete request: request-line, header fields, framing and body.
    ///
    /// `Content-Length` is added unless the headers already declare framing, or the body is
    /// empty and the method does not usually carry one.
    ///
    /// Requests may be pipelined: a request can be written before the response to the
    /// previous one has been read.
    pub async fn write_request(&mut self, request: &Request) -> Result<(), HttpError> {
        self.ensure_writable().await?;
        ensure!(
            matches!(self.write_state(), WriteState::Empty | WriteState::Finished),
            HttpError::OutOfOrder
        );

        let framing = if declares_framing(request.headers()) {
            Framing::AsIs
        } else if request.body().is_empty() && !request.need_body() {
            Framing::Implicit
        } else {
            Framing::Length(request.body().len() as u64)
        };

        let head = MessageHead {
            first_line: FirstLine::Request { method: request.method(), target: request.target() },
            headers: request.headers(),
            framing,
            connection: None,
        };
        self.encode_head(head)?;
        self.send(request.body()).await?;
        debug!(method = %request.method(), request_target = request.target(), body_size = request.body().len(), "sent request");

        self.after_request_head(request);
        self.finish_write();
        Ok(())
    }

    /// Writes the request-line and header fields of a request whose body follows in chunks.
    ///
    /// Fails with [`HttpError::NativeStreamUnsupported`] once the server was seen speaking
    /// HTTP/1.0.
    pub async fn write_request_metadata(&mut self, request: &Request) -> Result<(), HttpError> {
        self.ensure_writable().await?;
        {
            let shared = self.shared.lock();
            ensure!(
                matches!(shared.write_state, WriteState::Empty | WriteState::Finished),
                HttpError::OutOfOrder
            );
            ensure!(shared.peer_version >= 1, HttpError::NativeStreamUnsupported);
        }

        let head = MessageHead {
            first_line: FirstLine::Request { method: request.method(), target: request.target() },
            headers: request.headers(),
            framing: Framing::Chunked,
            connection: None,
        };
        self.encode_head(head)?;
        self.send(&[]).await?;
        debug!(method = %request.method(), request_target = request.target(), "sent request head");

        self.after_request_head(request);
        self.start_streaming(false);
        Ok(())
    }

    fn after_request_head(&mut self, request: &Request) {
        let mut shared = self.shared.lock();
        shared.pending_methods.push_back(request.method().clone());
        if !keep_alive(1, request.headers()) {
            shared.keep_alive = false;
        }
    }
}
