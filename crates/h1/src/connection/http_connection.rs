use http::HeaderMap;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::debug;

use crate::codec::{RequestReader, ResponseReader, TokenReader};
use crate::connection::message_reader::Input;
use crate::connection::message_writer::Output;
use crate::connection::state::SharedState;
use crate::connection::{MessageReader, MessageWriter, ReadState, WriteState};
use crate::protocol::{HttpError, HttpMessage, Request, Response};

/// Default maximum size of the read buffer, 8 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Server side of a connection: reads requests, writes responses.
pub type ServerConnection<S> = HttpConnection<S, RequestReader>;

/// Client side of a connection: writes requests, reads responses.
pub type ClientConnection<S> = HttpConnection<S, ResponseReader>;

/// An HTTP/1.x connection over an asynchronous byte stream.
///
/// `HttpConnection` owns the stream, a bounded read buffer and a token reader, and tracks
/// the read and write progress of the current exchange independently:
/// - reads fill the buffer, feed the reader and copy token values into the caller's message
/// - writes serialize a message, or its head followed by chunks, and flush them
///
/// Use [`ServerConnection`] to answer requests and [`ClientConnection`] to send them.
///
/// Operations issued in the wrong order fail with [`HttpError::OutOfOrder`] and touch
/// neither the stream nor the buffer.
///
/// The operations of both directions are available on the connection itself. To have a read
/// and a write outstanding at the same time, [`split`](Self::split) the connection into a
/// [`MessageReader`] and a [`MessageWriter`] and drive them concurrently, for example with
/// `tokio::join!`.
///
/// # Type Parameters
///
/// * `S`: The async stream type, both readable and writable
/// * `R`: The token reader, [`RequestReader`] or [`ResponseReader`]
#[derive(Debug)]
pub struct HttpConnection<S, R> {
    stream: S,
    input: Input<R>,
    output: Output,
    shared: SharedState,
}

impl<S, R: TokenReader + Default> HttpConnection<S, R> {
    fn with_reader(stream: S, max_buffer_size: usize) -> Self {
        Self { stream, input: Input::new(max_buffer_size), output: Output::new(), shared: SharedState::default() }
    }

    /// Reopens the connection on a fresh stream, forgetting everything about the old one.
    pub fn open(&mut self, stream: S) {
        debug!("reopening connection");
        let max_buffer_size = self.input.max_buffer_size();
        *self = Self::with_reader(stream, max_buffer_size);
    }
}

impl<S> HttpConnection<S, RequestReader> {
    /// Creates a server connection with a read buffer of [`DEFAULT_BUFFER_SIZE`].
    pub fn new(stream: S) -> Self {
        Self::with_capacity(stream, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a server connection whose read buffer never grows beyond `max_buffer_size`.
    ///
    /// A request head that does not fit is reported as [`HttpError::BufferExhausted`].
    pub fn with_capacity(stream: S, max_buffer_size: usize) -> Self {
        Self::with_reader(stream, max_buffer_size)
    }
}

impl<S> HttpConnection<S, ResponseReader> {
    /// Creates a client connection with a read buffer of [`DEFAULT_BUFFER_SIZE`].
    pub fn new(stream: S) -> Self {
        Self::with_capacity(stream, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a client connection whose read buffer never grows beyond `max_buffer_size`.
    pub fn with_capacity(stream: S, max_buffer_size: usize) -> Self {
        Self::with_reader(stream, max_buffer_size)
    }
}

impl<S, R> HttpConnection<S, R> {
    #[inline]
    pub fn read_state(&self) -> ReadState {
        self.shared.lock().read_state
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
    ///
    /// Derived from the last message head read, and narrowed by the last message written.
    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.shared.lock().keep_alive
    }

    /// Minor version of the last message head read, `1` before any.
    #[inline]
    pub fn peer_version(&self) -> u8 {
        self.shared.lock().peer_version
    }

    #[inline]
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn reader(&mut self) -> MessageReader<'_, &mut S, R> {
        MessageReader::new(&mut self.stream, &mut self.input, &self.shared)
    }

    fn writer(&mut self) -> MessageWriter<'_, &mut S, R> {
        MessageWriter::new(&mut self.stream, &mut self.output, &self.shared)
    }
}

impl<S, R> HttpConnection<S, R>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: TokenReader,
{
    /// Splits the connection into its read and write halves.
    ///
    /// Both halves work on the state of this connection: what one of them reads or writes
    /// is seen by the other one and by the connection once they are dropped. Each half still
    /// runs at most one operation at a time.
    pub fn split(&mut self) -> (MessageReader<'_, ReadHalf<&mut S>, R>, MessageWriter<'_, WriteHalf<&mut S>, R>) {
        let (read_half, write_half) = tokio::io::split(&mut self.stream);
        (
            MessageReader::new(read_half, &mut self.input, &self.shared),
            MessageWriter::new(write_half, &mut self.output, &self.shared),
        )
    }

    /// See [`MessageReader::read_some`].
    pub async fn read_some<M: HttpMessage>(&mut self, message: &mut M) -> Result<(), HttpError> {
        let result = self.reader().read_some(message).await;
        self.writer().shutdown_if_pending().await;
        result
    }

    /// See [`MessageReader::read_chunkext`].
    pub async fn read_chunkext<M: HttpMessage>(
        &mut self,
        message: &mut M,
        extensions: &mut Vec<(String, String)>,
    ) -> Result<usize, HttpError> {
        let result = self.reader().read_chunkext(message, extensions).await;
        self.writer().shutdown_if_pending().await;
        result
    }

    /// See [`MessageReader::read_trailers`].
    pub async fn read_trailers<M: HttpMessage>(&mut self, message: &mut M) -> Result<(), HttpError> {
        let result = self.reader().read_trailers(message).await;
        self.writer().shutdown_if_pending().await;
        result
    }

    /// See [`MessageWriter::write`].
    pub async fn write(&mut self, data: &[u8]) -> Result<(), HttpError> {
        self.writer().write(data).await
    }

    /// See [`MessageWriter::write_trailers`].
    pub async fn write_trailers(&mut self, trailers: &HeaderMap) -> Result<(), HttpError> {
        self.writer().write_trailers(trailers).await
    }

    /// See [`MessageWriter::write_end_of_message`].
    pub async fn write_end_of_message(&mut self) -> Result<(), HttpError> {
        self.writer().write_end_of_message().await
    }

    /// Shuts the write half of the stream down and marks the connection closed.
    ///
    /// Every operation but [`open`](Self::open) fails with `NotConnected` afterwards.
    pub async fn close(&mut self) -> Result<(), HttpError> {
        let result = self.writer().close().await;
        self.input.clear();
        result
    }
}

impl<S> HttpConnection<S, RequestReader>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// See [`MessageReader::read_request`].
    pub async fn read_request(&mut self, request: &mut Request) -> Result<bool, HttpError> {
        let result = self.reader().read_request(request).await;
        self.writer().shutdown_if_pending().await;
        result
    }

    /// See [`MessageWriter::write_response`].
    pub async fn write_response(&mut self, response: &Response) -> Result<(), HttpError> {
        self.writer().write_response(response).await
    }

    /// See [`MessageWriter::write_response_metadata`].
    pub async fn write_response_metadata(&mut self, response: &Response) -> Result<(), HttpError> {
        self.writer().write_response_metadata(response).await
    }

    /// See [`MessageWriter::write_response_continue`].
    pub async fn write_response_continue(&mut self) -> Result<(), HttpError> {
        self.writer().write_response_continue().await
    }
}

impl<S> HttpConnection<S, ResponseReader>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// See [`MessageReader::read_response`].
    pub async fn read_response(&mut self, response: &mut Response) -> Result<bool, HttpError> {
        let result = self.reader().read_response(response).await;
        self.writer().shutdown_if_pending().await;
        result
    }

    /// See [`MessageWriter::write_request`].
    pub async fn write_request(&mut self, request: &Request) -> Result<(), HttpError> {
        self.writer().write_request(request).await
    }

    /// See [`MessageWriter::write_request_metadata`].
    pub async fn write_request_metadata(&mut self, request: &Request) -> Result<(), HttpError> {
        self.writer().write_request_metadata(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Code;
    use crate::connection::mock_stream::MockStream;
    use crate::protocol::ParseError;
    use http::header::{CONTENT_LENGTH, HOST};
    use http::{HeaderValue, Method, StatusCode};
    use indoc::indoc;
    use std::io::ErrorKind;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    fn crlf(text: &str) -> Vec<u8> {
        text.replace('\n', "\r\n").into_bytes()
    }

    async fn read_body<S, R, M>(connection: &mut HttpConnection<S, R>, message: &mut M)
    where
        S: AsyncRead + AsyncWrite + Unpin,
        R: TokenReader,
        M: HttpMessage,
    {
        while connection.read_state() == ReadState::MessageReady {
            connection.read_some(message).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_request_in_three_byte_reads() {
        let mut connection = ServerConnection::new(MockStream::split(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n", 3));
        let mut request = Request::default();

        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.target(), "/");
        assert_eq!(request.headers()[HOST], "a");
        assert!(request.body().is_empty());
        assert_eq!(connection.read_state(), ReadState::Finished);
        assert_eq!(connection.peer_version(), 1);
        assert!(connection.keep_alive());
    }

    #[tokio::test]
    async fn test_content_length_body() {
        let input = crlf(indoc! {"
            POST /submit HTTP/1.1
            Host: example.com
            Content-Length: 11

            hello world"});

        for step in [1, 4, input.len()] {
            let mut connection = ServerConnection::new(MockStream::split(&input, step));
            let mut request = Request::default();

            assert!(connection.read_request(&mut request).await.unwrap());
            assert_eq!(request.method(), Method::POST);
            read_body(&mut connection, &mut request).await;

            assert_eq!(request.body(), b"hello world", "step {step}");
            assert_eq!(connection.read_state(), ReadState::Finished);
        }
    }

    #[tokio::test]
    async fn test_chunked_body_with_extensions_and_trailers() {
        let input = crlf(indoc! {r#"
            POST /upload HTTP/1.1
            Host: a
            Transfer-Encoding: chunked

            4;name=value;q="a b"
            Wiki
            5
            pedia
            0
            X-Checksum: abc

        "#});

        for step in [5, input.len()] {
            let mut connection = ServerConnection::new(MockStream::split(&input, step));
            let mut request = Request::default();
            let mut extensions = Vec::new();

            assert!(connection.read_request(&mut request).await.unwrap());
            let mut count = 0;
            while connection.read_state() == ReadState::MessageReady {
                count += connection.read_chunkext(&mut request, &mut extensions).await.unwrap();
            }
            assert_eq!(count, 2);
            assert_eq!(extensions, [("name".to_owned(), "value".to_owned()), ("q".to_owned(), "a b".to_owned())]);
            assert_eq!(request.body(), b"Wikipedia");
            assert_eq!(connection.read_state(), ReadState::BodyReady);

            connection.read_trailers(&mut request).await.unwrap();
            assert_eq!(connection.read_state(), ReadState::Finished);
            assert_eq!(request.trailers()["x-checksum"], "abc");
        }
    }

    #[tokio::test]
    async fn test_malformed_chunk_extensions_are_skipped() {
        let input = b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n4;ok=1;=bad;late=2\r\nWiki\r\n0\r\n\r\n";
        let mut connection = ServerConnection::new(MockStream::split(input, input.len()));
        let mut request = Request::default();
        let mut extensions = Vec::new();

        assert!(connection.read_request(&mut request).await.unwrap());
        while connection.read_state() == ReadState::MessageReady {
            connection.read_chunkext(&mut request, &mut extensions).await.unwrap();
        }
        assert_eq!(extensions, [("ok".to_owned(), "1".to_owned())]);
        assert_eq!(request.body(), b"Wiki");
        assert_eq!(connection.read_state(), ReadState::Finished);
        assert!(connection.is_open());
    }

    #[tokio::test]
    async fn test_chunked_body_without_trailers_finishes() {
        let input = b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n";
        let mut connection = ServerConnection::new(MockStream::split(input, input.len()));
        let mut request = Request::default();

        assert!(connection.read_request(&mut request).await.unwrap());
        read_body(&mut connection, &mut request).await;
        assert_eq!(request.body(), b"Wiki");
        assert!(request.trailers().is_empty());
        assert_eq!(connection.read_state(), ReadState::Finished);

        // nothing left to read
        connection.read_trailers(&mut request).await.unwrap();
        connection.read_some(&mut request).await.unwrap();
        assert_eq!(request.body(), b"Wiki");
    }

    #[tokio::test]
    async fn test_clean_end_of_stream() {
        let mut connection = ServerConnection::new(MockStream::default());
        let mut request = Request::default();

        assert!(!connection.read_request(&mut request).await.unwrap());
        assert!(connection.is_open());
    }

    #[tokio::test]
    async fn test_end_of_stream_inside_head() {
        let mut connection = ServerConnection::new(MockStream::new([b"POST /partial HTTP/1.1\r\nHost: a\r\nX-"]));
        let mut request = Request::default();

        let err = connection.read_request(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::UnexpectedEof));
        assert!(!connection.is_open());
        assert_eq!(connection.read_state(), ReadState::Empty);

        // nothing of the partial head is left behind
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.target(), "");
        assert!(request.headers().is_empty());
    }

    #[tokio::test]
    async fn test_read_error_clears_message() {
        let mut connection = ServerConnection::new(MockStream::failing([b"GET /partial HTTP/1.1\r\nHost: a\r\n"]));
        let mut request = Request::default();

        let err = connection.read_request(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::ConnectionReset));
        assert!(!connection.is_open());
        assert_eq!(request.target(), "");
        assert!(request.headers().is_empty());

        let input = b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 10\r\n\r\nabc";
        let mut connection = ServerConnection::new(MockStream::failing([input]));
        assert!(connection.read_request(&mut request).await.unwrap());
        connection.read_some(&mut request).await.unwrap();
        assert_eq!(request.body(), b"abc");

        let err = connection.read_some(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::ConnectionReset));
        assert!(request.body().is_empty());
        assert!(request.headers().is_empty());
        assert_eq!(connection.read_state(), ReadState::Empty);
    }

    #[tokio::test]
    async fn test_end_of_stream_inside_body() {
        let mut connection =
            ServerConnection::new(MockStream::new([b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 10\r\n\r\nabc"]));
        let mut request = Request::default();

        assert!(connection.read_request(&mut request).await.unwrap());
        connection.read_some(&mut request).await.unwrap();
        assert_eq!(request.body(), b"abc");

        let err = connection.read_some(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_buffer_exhausted() {
        let input = b"GET /a-very-long-target HTTP/1.1\r\nHost: a\r\n\r\n";
        let mut connection = ServerConnection::with_capacity(MockStream::split(input, input.len()), 16);
        let mut request = Request::default();

        let err = connection.read_request(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::BufferExhausted { expected: Code::RequestTarget }));
        assert!(!err.is_usage_error());
        assert!(connection.is_open());
    }

    #[tokio::test]
    async fn test_parse_error_closes_connection() {
        let mut connection = ServerConnection::new(MockStream::new([b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n"]));
        let mut request = Request::default();

        let err = connection.read_request(&mut request).await.unwrap_err();
        assert_eq!(err.parse_error(), Some(ParseError::NoHost));
        assert!(!connection.is_open());
        assert!(connection.get_ref().shutdown);
        assert!(request.headers().is_empty());

        let err = connection.read_request(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::NotConnected));
    }

    #[tokio::test]
    async fn test_out_of_order_reads() {
        let input = b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\n\r\nabc";
        let mut connection = ServerConnection::new(MockStream::split(input, 8));
        let mut request = Request::default();

        assert!(matches!(connection.read_some(&mut request).await, Err(HttpError::OutOfOrder)));
        assert!(matches!(connection.read_trailers(&mut request).await, Err(HttpError::OutOfOrder)));

        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(connection.read_state(), ReadState::MessageReady);
        assert!(matches!(connection.read_request(&mut request).await, Err(HttpError::OutOfOrder)));
        assert!(matches!(connection.read_trailers(&mut request).await, Err(HttpError::OutOfOrder)));

        // the failed calls left the message untouched
        assert_eq!(request.target(), "/");
        read_body(&mut connection, &mut request).await;
        assert_eq!(request.body(), b"abc");
    }

    #[tokio::test]
    async fn test_pipelined_requests_share_the_buffer() {
        let input = crlf(indoc! {"
            GET /first HTTP/1.1
            Host: a

            POST /second HTTP/1.1
            Host: a
            Content-Length: 4

            body"});
        let mut connection = ServerConnection::new(MockStream::split(&input, input.len()));
        let mut request = Request::default();

        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(request.target(), "/first");
        connection.write_response(&Response::new(StatusCode::OK)).await.unwrap();
        assert_eq!(connection.read_state(), ReadState::Empty);

        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(request.target(), "/second");
        assert_eq!(request.headers()[CONTENT_LENGTH], "4");
        read_body(&mut connection, &mut request).await;
        assert_eq!(request.body(), b"body");
    }

    #[tokio::test]
    async fn test_http10_request() {
        let mut connection = ServerConnection::new(MockStream::new([b"GET / HTTP/1.0\r\n\r\n"]));
        let mut request = Request::default();

        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(connection.peer_version(), 0);
        assert!(!connection.keep_alive());
    }

    #[tokio::test]
    async fn test_close_and_reopen() {
        let mut connection = ServerConnection::new(MockStream::default());
        connection.close().await.unwrap();
        assert!(!connection.is_open());
        assert!(connection.get_ref().shutdown);

        let mut request = Request::default();
        assert!(connection.read_request(&mut request).await.is_err());

        connection.open(MockStream::new([b"GET /again HTTP/1.1\r\nHost: a\r\n\r\n"]));
        assert!(connection.is_open());
        assert!(connection.read_request(&mut request).await.unwrap());
        assert_eq!(request.target(), "/again");
    }

    fn get(target: &str) -> Request {
        Request::new(Method::GET, target).with_header(HOST, HeaderValue::from_static("a"))
    }

    #[tokio::test]
    async fn test_response_without_request() {
        let mut connection = ClientConnection::new(MockStream::new([b"HTTP/1.1 200 OK\r\n\r\n"]));
        let mut response = Response::default();

        assert!(matches!(connection.read_response(&mut response).await, Err(HttpError::OutOfOrder)));
    }

    #[tokio::test]
    async fn test_connection_delimited_response() {
        let mut connection = ClientConnection::new(MockStream::new([&b"HTTP/1.0 200 OK\r\n\r\nsome "[..], b"data"]));
        let mut response = Response::default();

        connection.write_request(&get("/")).await.unwrap();
        assert!(connection.read_response(&mut response).await.unwrap());
        assert_eq!(connection.peer_version(), 0);
        assert!(!connection.keep_alive());

        read_body(&mut connection, &mut response).await;
        assert_eq!(response.body(), b"some data");
        assert_eq!(connection.read_state(), ReadState::Empty);
        assert!(matches!(connection.write_request(&get("/")).await, Err(HttpError::StreamFinished)));
    }

    #[tokio::test]
    async fn test_interim_response_then_final() {
        let input = b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
        let mut connection = ClientConnection::new(MockStream::split(input, 7));
        let mut response = Response::default();

        connection.write_request(&get("/")).await.unwrap();

        assert!(connection.read_response(&mut response).await.unwrap());
        assert_eq!(response.status(), StatusCode::CONTINUE);

        assert!(connection.read_response(&mut response).await.unwrap());
        assert_eq!(response.status(), StatusCode::OK);
        read_body(&mut connection, &mut response).await;
        assert_eq!(response.body(), b"ok");

        // both responses answered the single request
        assert!(matches!(connection.read_response(&mut response).await, Err(HttpError::OutOfOrder)));
    }

    #[tokio::test]
    async fn test_pipelined_responses_follow_request_methods() {
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\naHTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\n";
        let mut connection = ClientConnection::new(MockStream::split(input, input.len()));
        let mut response = Response::default();

        connection.write_request(&get("/a")).await.unwrap();
        connection.write_request(&Request::new(Method::HEAD, "/b").with_header(HOST, HeaderValue::from_static("a"))).await.unwrap();
        assert_eq!(
            connection.get_ref().written(),
            "GET /a HTTP/1.1\r\nhost: a\r\n\r\nHEAD /b HTTP/1.1\r\nhost: a\r\n\r\n"
        );

        assert!(connection.read_response(&mut response).await.unwrap());
        read_body(&mut connection, &mut response).await;
        assert_eq!(response.body(), b"a");

        assert!(connection.read_response(&mut response).await.unwrap());
        assert_eq!(response.headers()[CONTENT_LENGTH], "1");
        assert!(response.body().is_empty());
        assert_eq!(connection.read_state(), ReadState::Finished);
    }

    #[tokio::test]
    async fn test_split_reads_body_while_writing() {
        let (mut peer, server_io) = duplex(1024);
        let mut connection = ServerConnection::new(server_io);
        let mut request = Request::default();

        peer.write_all(b"POST /chat HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n").await.unwrap();
        assert!(connection.read_request(&mut request).await.unwrap());
        connection.write_response_metadata(&Response::new(StatusCode::OK)).await.unwrap();

        let (mut reader, mut writer) = connection.split();

        // the peer only sends the body chunk after it received the response chunk
        let read = reader.read_some(&mut request);
        let write = async {
            writer.write(b"pong").await.unwrap();
            let mut received = Vec::new();
            while !received.ends_with(b"4\r\npong\r\n") {
                let mut piece = [0; 256];
                let n = peer.read(&mut piece).await.unwrap();
                assert_ne!(n, 0);
                received.extend_from_slice(&piece[..n]);
            }
            peer.write_all(b"5\r\nhello\r\n").await.unwrap();
            received
        };
        let (read, received) = tokio::join!(read, write);

        read.unwrap();
        assert_eq!(request.body(), b"hello");
        assert_eq!(received, b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n4\r\npong\r\n");

        peer.write_all(b"0\r\n\r\n").await.unwrap();
        while reader.read_state() == ReadState::MessageReady {
            reader.read_some(&mut request).await.unwrap();
        }
        assert_eq!(reader.read_state(), ReadState::Finished);
        writer.write_end_of_message().await.unwrap();
        drop((reader, writer));

        assert_eq!(connection.read_state(), ReadState::Empty);
        assert_eq!(connection.write_state(), WriteState::Empty);
        assert!(connection.keep_alive());
    }

    #[tokio::test]
    async fn test_split_parse_error_shuts_down_on_next_write() {
        let input = b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n";
        let mut connection = ServerConnection::new(MockStream::split(input, input.len()));
        let mut request = Request::default();
        assert!(connection.read_request(&mut request).await.unwrap());

        let (mut reader, mut writer) = connection.split();
        let err = reader.read_some(&mut request).await.unwrap_err();
        assert!(err.is_parse_error());
        assert!(!writer.is_open());

        let err = writer.write_response(&Response::new(StatusCode::BAD_REQUEST)).await.unwrap_err();
        assert!(matches!(err, HttpError::Io { ref source } if source.kind() == ErrorKind::NotConnected));
        drop((reader, writer));

        assert!(connection.get_ref().shutdown);
        assert!(connection.get_ref().written.is_empty());
    }
}
