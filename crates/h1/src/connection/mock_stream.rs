use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A scripted stream: every read returns the next scripted piece, or what fits of it, and
/// the end of the script is the end of the stream, or a read error for a
/// [`failing`](MockStream::failing) stream. Writes are collected.
#[derive(Debug, Default)]
pub(crate) struct MockStream {
    reads: VecDeque<Vec<u8>>,
    fail_at_end: bool,
    pub(crate) written: Vec<u8>,
    pub(crate) shutdown: bool,
}

impl MockStream {
    pub(crate) fn new<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let reads = reads.into_iter().map(|piece| piece.as_ref().to_vec()).filter(|piece| !piece.is_empty()).collect();
        Self { reads, fail_at_end: false, written: Vec::new(), shutdown: false }
    }

    /// Like [`new`](Self::new), with a `ConnectionReset` error instead of the end of stream.
    pub(crate) fn failing<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self { fail_at_end: true, ..Self::new(reads) }
    }

    /// Delivers `input` in reads of at most `step` bytes.
    pub(crate) fn split(input: &[u8], step: usize) -> Self {
        Self::new(input.chunks(step))
    }

    pub(crate) fn written(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }
}

impl AsyncRead for MockStream {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if let Some(mut piece) = self.reads.pop_front() {
            let amt = piece.len().min(buf.remaining());
            buf.put_slice(&piece[..amt]);
            if amt < piece.len() {
                let rest = piece.split_off(amt);
                self.reads.push_front(rest);
            }
        } else if self.fail_at_end {
            return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        self.shutdown = true;
        Poll::Ready(Ok(()))
    }
}
