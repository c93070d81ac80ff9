//! A client and a server engine talking to each other over an in-memory duplex stream.

mod common;

use common::echo;
use http::header::{EXPECT, HOST};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use micro_h1::connection::{ClientConnection, ReadState, ServerConnection};
use micro_h1::protocol::{HttpError, HttpMessage, Request, Response};
use tokio::io::{duplex, AsyncRead, AsyncWrite};

fn request(method: Method, target: &str) -> Request {
    Request::new(method, target).with_header(HOST, HeaderValue::from_static("localhost"))
}

async fn read_full_response<S>(connection: &mut ClientConnection<S>, response: &mut Response) -> Result<(), HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    assert!(connection.read_response(response).await?);
    while connection.read_state() == ReadState::MessageReady {
        connection.read_some(response).await?;
    }
    // a finished exchange has already started over
    if connection.read_state() == ReadState::BodyReady {
        connection.read_trailers(response).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_pipelined_echo() {
    let (client_io, server_io) = duplex(4096);
    let server = tokio::spawn(echo(ServerConnection::new(server_io)));

    let mut client = ClientConnection::new(client_io);
    client.write_request(&request(Method::POST, "/echo").with_body("hello")).await.unwrap();

    let mut trailers = HeaderMap::new();
    trailers.insert("x-sum", HeaderValue::from_static("6"));
    client.write_request_metadata(&request(Method::PUT, "/stream")).await.unwrap();
    client.write(b"abc").await.unwrap();
    client.write(b"def").await.unwrap();
    client.write_trailers(&trailers).await.unwrap();

    let mut response = Response::default();
    read_full_response(&mut client, &mut response).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"hello");
    assert!(response.trailers().is_empty());

    read_full_response(&mut client, &mut response).await.unwrap();
    assert_eq!(response.body(), b"abcdef");
    assert_eq!(response.trailers()["x-sum"], "6");

    client.close().await.unwrap();
    assert_eq!(server.await.unwrap().unwrap(), 2);
}

#[tokio::test]
async fn test_expect_continue() {
    let (client_io, server_io) = duplex(4096);
    let server = tokio::spawn(echo(ServerConnection::new(server_io)));

    let mut client = ClientConnection::new(client_io);
    let upload = request(Method::POST, "/upload").with_header(EXPECT, HeaderValue::from_static("100-continue"));
    client.write_request_metadata(&upload).await.unwrap();

    let mut response = Response::default();
    assert!(client.read_response(&mut response).await.unwrap());
    assert_eq!(response.status(), StatusCode::CONTINUE);

    client.write(b"payload").await.unwrap();
    client.write_end_of_message().await.unwrap();

    read_full_response(&mut client, &mut response).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"payload");

    client.close().await.unwrap();
    assert_eq!(server.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_connection_close_ends_the_exchange() {
    let (client_io, server_io) = duplex(4096);
    let server = tokio::spawn(echo(ServerConnection::new(server_io)));

    let mut client = ClientConnection::new(client_io);
    let last = request(Method::GET, "/").with_header(http::header::CONNECTION, HeaderValue::from_static("close"));
    client.write_request(&last).await.unwrap();

    let mut response = Response::default();
    read_full_response(&mut client, &mut response).await.unwrap();
    assert_eq!(response.headers()["connection"], "close");
    assert!(!client.keep_alive());
    assert!(matches!(client.write_request(&last).await, Err(HttpError::StreamFinished)));

    assert_eq!(server.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_oversized_head_is_answered() {
    let (client_io, server_io) = duplex(4096);

    let server = tokio::spawn(async move {
        let mut connection = ServerConnection::with_capacity(server_io, 64);
        let mut request = Request::default();
        let err = connection.read_request(&mut request).await.unwrap_err();
        assert!(matches!(err, HttpError::BufferExhausted { .. }));

        connection.write_response(&Response::new(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)).await.unwrap();
        assert!(!connection.keep_alive());
        connection.close().await.unwrap();
    });

    let mut client = ClientConnection::new(client_io);
    let long_value = HeaderValue::from_str(&"x".repeat(200)).unwrap();
    client.write_request(&request(Method::GET, "/").with_header(http::header::COOKIE, long_value)).await.unwrap();

    let mut response = Response::default();
    assert!(client.read_response(&mut response).await.unwrap());
    assert_eq!(response.status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
    assert_eq!(response.headers()["connection"], "close");
    assert!(!client.keep_alive());

    server.await.unwrap();
}
