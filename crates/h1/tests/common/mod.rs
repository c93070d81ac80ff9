#![allow(dead_code, reason = "each test target uses a different part of this module")]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use micro_h1::connection::{ReadState, ServerConnection};
use micro_h1::protocol::{HttpError, HttpMessage, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// In-memory stream replaying scripted reads and recording writes; never pending.
#[derive(Debug, Default)]
pub struct ScriptedStream {
    reads: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
}

impl ScriptedStream {
    /// Delivers `input` in reads whose sizes cycle through `steps`.
    pub fn with_steps(input: &[u8], steps: &[usize]) -> Self {
        let mut reads = VecDeque::new();
        let mut rest = input;
        for step in steps.iter().copied().filter(|step| *step > 0).cycle() {
            if rest.is_empty() {
                break;
            }
            let (piece, tail) = rest.split_at(step.min(rest.len()));
            reads.push_back(piece.to_vec());
            rest = tail;
        }
        Self { reads, written: Vec::new() }
    }

    pub fn whole(input: &[u8]) -> Self {
        Self::with_steps(input, &[input.len()])
    }
}

impl AsyncRead for ScriptedStream {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if let Some(mut piece) = self.reads.pop_front() {
            let amt = piece.len().min(buf.remaining());
            buf.put_slice(&piece[..amt]);
            if amt < piece.len() {
                let rest = piece.split_off(amt);
                self.reads.push_front(rest);
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Reads the body and the trailers of a message whose head was just read.
pub async fn read_rest<S, M>(connection: &mut ServerConnection<S>, message: &mut M) -> Result<(), HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    M: HttpMessage,
{
    while connection.read_state() == ReadState::MessageReady {
        connection.read_some(message).await?;
    }
    if connection.read_state() == ReadState::BodyReady {
        connection.read_trailers(message).await?;
    }
    Ok(())
}

/// Answers every request with its own body and trailers, streamed back in chunks.
pub async fn echo<S>(mut connection: ServerConnection<S>) -> Result<usize, HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = Request::default();
    let mut served = 0;

    while connection.read_request(&mut request).await? {
        if request.expects_continue() {
            connection.write_response_continue().await?;
        }
        read_rest(&mut connection, &mut request).await?;

        connection.write_response_metadata(&Response::default()).await?;
        connection.write(request.body()).await?;
        connection.write_trailers(request.trailers()).await?;
        served += 1;

        if !connection.keep_alive() {
            break;
        }
    }
    Ok(served)
}
