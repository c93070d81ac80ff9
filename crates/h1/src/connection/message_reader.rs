//! The read half of [`HttpConnection`](crate::connection::HttpConnection).
//!
//! Every read operation runs the same cycle: fill the free tail of the bounded buffer from
//! the stream, feed the buffered bytes to the token reader, copy token values into the
//! caller's message and drop what the reader committed, until the operation reached its
//! milestone.

use std::io::{self, ErrorKind};

use bytes::{Buf, BufMut, BytesMut};
use http::{HeaderName, HeaderValue, StatusCode};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, trace, warn};

use crate::codec::{ChunkExtensions, Code, RequestReader, ResponseReader, Token, TokenReader, Tokens};
use crate::connection::state::{Shared, SharedState};
use crate::connection::ReadState;
use crate::ensure;
use crate::protocol::{keep_alive, HttpError, HttpMessage, ParseError, Request, Response, StartLine};

type ApplyStartLine<M> = fn(&mut M, &Token<'_>) -> Result<(), ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Milestone {
    Head,
    Body,
    Trailers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Reached,
    NeedMore,
}

/// The bounded read buffer and the token reader of a connection.
#[derive(Debug)]
pub(crate) struct Input<R> {
    buffer: BytesMut,
    max_buffer_size: usize,
    reader: R,
    pending_field: Option<HeaderName>,
}

impl<R: Default> Input<R> {
    pub(crate) fn new(max_buffer_size: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(max_buffer_size), max_buffer_size, reader: R::default(), pending_field: None }
    }
}

impl<R> Input<R> {
    pub(crate) fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.pending_field = None;
    }
}

/// Reads messages from a connection.
///
/// [`HttpConnection::split`](crate::connection::HttpConnection::split) hands one out
/// together with the [`MessageWriter`](crate::connection::MessageWriter) of the same
/// connection, so a body can be read while the other direction is written.
/// [`HttpConnection`](crate::connection::HttpConnection) offers the same operations directly.
///
/// # Type Parameters
///
/// * `Io`: The readable side of the stream
/// * `R`: The token reader, [`RequestReader`] or [`ResponseReader`]
#[derive(Debug)]
pub struct MessageReader<'a, Io, R> {
    io: Io,
    input: &'a mut Input<R>,
    shared: &'a SharedState,
}

impl<'a, Io, R> MessageReader<'a, Io, R> {
    pub(crate) fn new(io: Io, input: &'a mut Input<R>, shared: &'a SharedState) -> Self {
        Self { io, input, shared }
    }

    #[inline]
    pub fn read_state(&self) -> ReadState {
        self.shared.lock().read_state
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

    /// Minor version of the last message head read, `1` before any.
    #[inline]
    pub fn peer_version(&self) -> u8 {
        self.shared.lock().peer_version
    }

    fn ensure_open(&self) -> Result<(), HttpError> {
        self.shared.lock().ensure_open()
    }

    fn settle(&self) {
        self.shared.lock().settle();
    }

    fn io_failed(&mut self, e: io::Error) -> HttpError {
        warn!(cause = %e, "connection failed, closing it");
        self.input.clear();
        self.shared.lock().mark_closed();
        HttpError::io(e)
    }

    /// Closes the connection; the write side shuts the stream down on its next operation.
    fn parse_failed(&mut self, e: ParseError) -> HttpError {
        error!(cause = %e, "malformed message, closing connection");
        self.input.clear();
        let mut shared = self.shared.lock();
        shared.mark_closed();
        shared.shutdown_pending = true;
        HttpError::from(e)
    }
}

impl<Io, R> MessageReader<'_, Io, R>
where
    Io: AsyncRead + Unpin,
    R: TokenReader,
{
    /// Reads the next body increment into the message body.
    ///
    /// Every body byte available without waiting is appended; the call only waits when
    /// nothing is available. Once the body is complete the read state moves to
    /// [`ReadState::BodyReady`], or [`ReadState::Finished`] when no trailer section can
    /// follow. With the body already complete this appends nothing.
    pub async fn read_some<M: HttpMessage>(&mut self, message: &mut M) -> Result<(), HttpError> {
        self.read_body(message, None).await
    }

    /// Like [`read_some`](Self::read_some), and also decodes the extensions of the chunks
    /// read into `extensions`. Returns the number of pairs added.
    ///
    /// Extensions are advisory: the pairs of a chunk are decoded up to the first malformed
    /// one, the rest of that chunk's extensions is skipped, and the body is read on as with
    /// [`read_some`](Self::read_some). Only bytes that cannot appear in a chunk line at all
    /// are a parse error.
    pub async fn read_chunkext<M: HttpMessage>(
        &mut self,
        message: &mut M,
        extensions: &mut Vec<(String, String)>,
    ) -> Result<usize, HttpError> {
        let before = extensions.len();
        self.read_body(message, Some(extensions)).await?;
        Ok(extensions.len() - before)
    }

    /// Reads the trailer section, ending the message.
    ///
    /// Legal once the body is complete.
    pub async fn read_trailers<M: HttpMessage>(&mut self, message: &mut M) -> Result<(), HttpError> {
        self.ensure_open()?;
        let read_state = self.read_state();
        match read_state {
            ReadState::Empty | ReadState::MessageReady => Err(HttpError::OutOfOrder),
            ReadState::Finished => Ok(()),
            ReadState::BodyReady => {
                self.drive(message, Milestone::Trailers, no_start_line, None).await?;
                self.settle();
                Ok(())
            }
        }
    }

    async fn read_body<M: HttpMessage>(
        &mut self,
        message: &mut M,
        extensions: Option<&mut Vec<(String, String)>>,
    ) -> Result<(), HttpError> {
        self.ensure_open()?;
        let read_state = self.read_state();
        match read_state {
            ReadState::Empty => Err(HttpError::OutOfOrder),
            ReadState::BodyReady | ReadState::Finished => Ok(()),
            ReadState::MessageReady => {
                self.drive(message, Milestone::Body, no_start_line, extensions).await?;
                self.settle();
                Ok(())
            }
        }
    }

    /// The fill / feed / compact cycle.
    ///
    /// Returns `Ok(false)` when the stream ended cleanly before a new message head. The
    /// message is cleared whenever the cycle closes the connection.
    async fn drive<M: HttpMessage>(
        &mut self,
        message: &mut M,
        milestone: Milestone,
        start_line: ApplyStartLine<M>,
        mut extensions: Option<&mut Vec<(String, String)>>,
    ) -> Result<bool, HttpError> {
        let mut eof = false;

        loop {
            match self.feed(message, milestone, start_line, extensions.as_deref_mut()) {
                Ok(Progress::Reached) => return Ok(true),
                Ok(Progress::NeedMore) => {}
                Err(e) => {
                    message.clear();
                    return Err(self.parse_failed(e));
                }
            }

            if eof {
                message.clear();
                return Err(self.io_failed(ErrorKind::UnexpectedEof.into()));
            }

            if self.input.buffer.len() >= self.input.max_buffer_size {
                let expected = self.input.reader.expected_token();
                warn!(buffer_size = self.input.buffer.len(), ?expected, "read buffer exhausted");
                return Err(HttpError::buffer_exhausted(expected));
            }

            let filled = match self.fill_buf().await {
                Ok(filled) => filled,
                Err(e) => {
                    message.clear();
                    return Err(e);
                }
            };

            if filled == 0 {
                if milestone == Milestone::Head && self.input.buffer.is_empty() && self.input.reader.is_message_start() {
                    debug!("peer closed the connection");
                    return Ok(false);
                }
                self.input.reader.puteof();
                eof = true;
            }
        }
    }

    /// Reads once into the free tail of the buffer.
    async fn fill_buf(&mut self) -> Result<usize, HttpError> {
        let free = self.input.max_buffer_size - self.input.buffer.len();
        self.input.buffer.reserve(free);

        let read = self.io.read_buf(&mut (&mut self.input.buffer).limit(free)).await;
        match read {
            Ok(n) => {
                trace!(n, buffered = self.input.buffer.len(), "read bytes");
                Ok(n)
            }
            Err(e) => Err(self.io_failed(e)),
        }
    }

    /// Feeds the buffered bytes to the reader and drops what it committed.
    fn feed<M: HttpMessage>(
        &mut self,
        message: &mut M,
        milestone: Milestone,
        start_line: ApplyStartLine<M>,
        extensions: Option<&mut Vec<(String, String)>>,
    ) -> Result<Progress, ParseError> {
        let Input { buffer, reader, pending_field, .. } = &mut *self.input;
        let mut shared = self.shared.lock();
        let Shared { read_state, peer_version, .. } = &mut *shared;

        let mut tokens = reader.set_buffer(&mut buffer[..]);
        let progress = match milestone {
            Milestone::Head => {
                // the previous message ends here
                if tokens.code() == Code::EndOfMessage {
                    tokens.next();
                }
                consume_head(&mut tokens, message, start_line, read_state, pending_field, peer_version)
            }
            Milestone::Body => consume_body(&mut tokens, message, read_state, extensions),
            Milestone::Trailers => consume_trailers(&mut tokens, message, read_state, pending_field),
        };

        let parsed = tokens.parsed_count();
        buffer.advance(parsed);
        progress
    }
}

impl<Io> MessageReader<'_, Io, RequestReader>
where
    Io: AsyncRead + Unpin,
{
    /// Reads the start-line and header fields of the next request.
    ///
    /// Returns `Ok(false)` when the peer closed the connection before sending anything of
    /// a new request. A request without body is [`ReadState::Finished`] on return.
    pub async fn read_request(&mut self, request: &mut Request) -> Result<bool, HttpError> {
        {
            let shared = self.shared.lock();
            shared.ensure_open()?;
            ensure!(shared.read_state == ReadState::Empty, HttpError::OutOfOrder);
        }

        request.clear();
        if !self.drive(request, Milestone::Head, <Request as StartLine>::apply_start_line, None).await? {
            return Ok(false);
        }

        let mut shared = self.shared.lock();
        shared.keep_alive = keep_alive(shared.peer_version, request.headers());
        shared.request_method = request.method().clone();
        debug!(
            method = %request.method(),
            request_target = request.target(),
            version = shared.peer_version,
            keep_alive = shared.keep_alive,
            "received request head"
        );

        shared.settle();
        Ok(true)
    }
}

impl<Io> MessageReader<'_, Io, ResponseReader>
where
    Io: AsyncRead + Unpin,
{
    /// Reads the status-line and header fields of the response to the oldest request
    /// written and not answered yet.
    ///
    /// An interim (1xx) response is returned like any other; the final response to the
    /// same request is read by the next call.
    pub async fn read_response(&mut self, response: &mut Response) -> Result<bool, HttpError> {
        let method = {
            let mut shared = self.shared.lock();
            shared.ensure_open()?;
            if shared.read_state == ReadState::Finished {
                shared.read_state = ReadState::Empty;
            }
            ensure!(shared.read_state == ReadState::Empty, HttpError::OutOfOrder);
            shared.pending_methods.front().cloned().ok_or(HttpError::OutOfOrder)?
        };
        self.input.reader.set_method(&method);

        response.clear();
        if !self.drive(response, Milestone::Head, <Response as StartLine>::apply_start_line, None).await? {
            return Ok(false);
        }

        let status = response.status();
        let mut shared = self.shared.lock();
        if !status.is_informational() || status == StatusCode::SWITCHING_PROTOCOLS {
            shared.pending_methods.pop_front();
        }

        shared.keep_alive = keep_alive(shared.peer_version, response.headers());
        if !shared.keep_alive {
            shared.stream_finished = true;
        }
        debug!(
            status = status.as_u16(),
            version = shared.peer_version,
            keep_alive = shared.keep_alive,
            "received response head"
        );

        shared.settle();
        Ok(true)
    }
}

fn no_start_line<M>(_message: &mut M, _token: &Token<'_>) -> Result<(), ParseError> {
    Ok(())
}

fn header_name(name: &str) -> Result<HeaderName, ParseError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_e| ParseError::InvalidData)
}

fn header_value(value: &[u8]) -> Result<HeaderValue, ParseError> {
    HeaderValue::from_bytes(value).map_err(|_e| ParseError::InvalidData)
}

/// Consumes tokens carrying no data that are available right away.
///
/// Called once a milestone was reached, so a message without body, or without trailers,
/// finishes without another read.
fn consume_markers(tokens: &mut Tokens<'_, '_>, read_state: &mut ReadState) {
    if tokens.code() == Code::EndOfBody {
        tokens.next();
        *read_state = ReadState::BodyReady;
    }
    if *read_state == ReadState::BodyReady && tokens.code() == Code::EndOfMessage {
        *read_state = ReadState::Finished;
    }
}

fn consume_head<M: HttpMessage>(
    tokens: &mut Tokens<'_, '_>,
    message: &mut M,
    start_line: ApplyStartLine<M>,
    read_state: &mut ReadState,
    pending_field: &mut Option<HeaderName>,
    peer_version: &mut u8,
) -> Result<Progress, ParseError> {
    loop {
        match tokens.code() {
            Code::Insufficient => return Ok(Progress::NeedMore),
            Code::Error(e) => return Err(e),
            Code::EndOfHeaders => {
                tokens.next();
                *read_state = ReadState::MessageReady;
                consume_markers(tokens, read_state);
                return Ok(Progress::Reached);
            }
            _ => {}
        }

        match tokens.token() {
            Some(Token::Version(version)) => *peer_version = version,
            Some(Token::FieldName(name)) => *pending_field = Some(header_name(name)?),
            Some(Token::FieldValue(value)) => {
                let name = pending_field.take().ok_or(ParseError::InvalidData)?;
                message.headers_mut().append(name, header_value(value)?);
            }
            Some(token) => start_line(message, &token)?,
            None => {}
        }
        tokens.next();
    }
}

/// Appends the chunk extensions of `raw` up to the first malformed one.
fn push_extensions(raw: &[u8], extensions: &mut Vec<(String, String)>) {
    for extension in ChunkExtensions::new(raw) {
        match extension {
            Ok((name, value)) => extensions.push((name.to_owned(), value.into_owned())),
            Err(e) => {
                debug!(cause = %e, "skipping malformed chunk extensions");
                break;
            }
        }
    }
}

fn consume_body<M: HttpMessage>(
    tokens: &mut Tokens<'_, '_>,
    message: &mut M,
    read_state: &mut ReadState,
    mut extensions: Option<&mut Vec<(String, String)>>,
) -> Result<Progress, ParseError> {
    let mut appended = false;

    loop {
        match tokens.code() {
            Code::Insufficient if appended => return Ok(Progress::Reached),
            Code::Insufficient => return Ok(Progress::NeedMore),
            Code::Error(e) => return Err(e),
            Code::EndOfBody => {
                consume_markers(tokens, read_state);
                return Ok(Progress::Reached);
            }
            _ => {}
        }

        match tokens.token() {
            Some(Token::BodyChunk(chunk)) => {
                message.body_mut().extend_from_slice(chunk);
                appended = true;
            }
            Some(Token::ChunkExt(raw)) => {
                if let Some(extensions) = extensions.as_deref_mut() {
                    push_extensions(raw, extensions);
                }
            }
            _ => {}
        }
        tokens.next();
    }
}

fn consume_trailers<M: HttpMessage>(
    tokens: &mut Tokens<'_, '_>,
    message: &mut M,
    read_state: &mut ReadState,
    pending_field: &mut Option<HeaderName>,
) -> Result<Progress, ParseError> {
    loop {
        match tokens.code() {
            Code::Insufficient => return Ok(Progress::NeedMore),
            Code::Error(e) => return Err(e),
            Code::EndOfMessage => {
                *read_state = ReadState::Finished;
                return Ok(Progress::Reached);
            }
            _ => {}
        }

        match tokens.token() {
            Some(Token::TrailerName(name)) => *pending_field = Some(header_name(name)?),
            Some(Token::TrailerValue(value)) => {
                let name = pending_field.take().ok_or(ParseError::InvalidData)?;
                message.trailers_mut().append(name, header_value(value)?);
            }
            _ => {}
        }
        tokens.next();
    }
}
