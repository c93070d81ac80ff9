//! Echoes every request body back, chunk by chunk, with the request's trailers.
//!
//! ```text
//! cargo run -p micro-h1 --example echo_server
//! curl -v --data-binary @Cargo.toml http://127.0.0.1:8080/
//! ```

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use micro_h1::connection::{ReadState, ServerConnection};
use micro_h1::protocol::{HttpError, HttpMessage, Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            match serve(tcp_stream).await {
                Ok(served) => info!(%remote_addr, served, "connection finished"),
                Err(e) => error!(%remote_addr, cause = %e, "connection failed"),
            }
        });
    }
}

async fn serve(tcp_stream: TcpStream) -> Result<usize, HttpError> {
    let mut connection = ServerConnection::new(tcp_stream);
    let mut request = Request::default();
    let mut served = 0;

    loop {
        match connection.read_request(&mut request).await {
            Ok(true) => {}
            Ok(false) => return Ok(served),
            Err(HttpError::BufferExhausted { expected }) => {
                warn!(?expected, "request head too large");
                connection.write_response(&Response::new(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)).await?;
                connection.close().await?;
                return Ok(served);
            }
            Err(e) => return Err(e),
        }
        info!(method = %request.method(), request_target = request.target(), "request");

        if request.expects_continue() {
            connection.write_response_continue().await?;
        }

        let content_type = request.headers().get(CONTENT_TYPE).cloned();
        let mut response = Response::new(StatusCode::OK);
        if let Some(content_type) = content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        } else {
            response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        }

        if connection.peer_version() == 0 {
            // no chunked coding for HTTP/1.0, answer once the whole body is in
            while connection.read_state() == ReadState::MessageReady {
                connection.read_some(&mut request).await?;
            }
            connection.read_trailers(&mut request).await?;
            response.set_body(request.body());
            connection.write_response(&response).await?;
        } else {
            connection.write_response_metadata(&response).await?;
            let mut sent = 0;
            while connection.read_state() == ReadState::MessageReady {
                connection.read_some(&mut request).await?;
                connection.write(&request.body()[sent..]).await?;
                sent = request.body().len();
            }
            connection.read_trailers(&mut request).await?;
            connection.write_trailers(request.trailers()).await?;
        }
        served += 1;

        if !connection.keep_alive() {
            connection.close().await?;
            return Ok(served);
        }
    }
}
