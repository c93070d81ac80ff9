//! HTTP header encoder implementation for serializing message heads
//!
//! This module serializes a start-line and the header fields of a request or a response
//! into raw bytes. The framing header (`Content-Length` or `Transfer-Encoding`) is chosen by
//! the caller through [`Framing`].
//!
//! # Features
//!
//! - Request-line and status-line serialization, always as `HTTP/1.1`
//! - Each header field written as `name: value\r\n`, in the header map's order
//! - Engine-managed `Content-Length` / `Transfer-Encoding: chunked`
//! - Optional `Connection` field when persistence differs from the version default

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, Method, StatusCode};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// How the body length is communicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The caller's headers already declare framing, write them untouched.
    AsIs,
    /// No framing header at all; caller framing fields are dropped.
    Implicit,
    /// `Content-Length: n`; caller framing fields are dropped.
    Length(u64),
    /// `Transfer-Encoding: chunked`; caller framing fields are dropped.
    Chunked,
}

/// The first line of a message.
#[derive(Debug, Clone, Copy)]
pub enum FirstLine<'a> {
    Request { method: &'a Method, target: &'a str },
    Response { status: StatusCode, reason: &'a [u8] },
}

/// Everything needed to serialize a message head.
#[derive(Debug, Clone, Copy)]
pub struct MessageHead<'a> {
    pub first_line: FirstLine<'a>,
    pub headers: &'a HeaderMap,
    pub framing: Framing,
    /// Value of an extra `Connection` field, if one has to be added.
    pub connection: Option<&'static str>,
}

/// Encoder for message heads implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<MessageHead<'_>> for HeaderEncoder {
    type Error = io::Error;

    /// Encodes the start-line, the header fields and the terminating blank line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the request-target or the reason phrase would break the
    /// start-line (contains SP, CR or LF where not allowed).
    fn encode(&mut self, item: MessageHead<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);

        match item.first_line {
            FirstLine::Request { method, target } => {
                if target.is_empty() || target.bytes().any(|b| b == b' ' || b == b'\r' || b == b'\n') {
                    error!(request_target = target, "invalid request target");
                    return Err(io::Error::from(ErrorKind::InvalidInput));
                }
                write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", method.as_str(), target)?;
            }
            FirstLine::Response { status, reason } => {
                if reason.iter().any(|b| *b == b'\r' || *b == b'\n') {
                    error!(reason = %String::from_utf8_lossy(reason), "invalid reason phrase");
                    return Err(io::Error::from(ErrorKind::InvalidInput));
                }
                let reason = if reason.is_empty() { status.canonical_reason().unwrap_or_default().as_bytes() } else { reason };
                write!(FastWrite(dst), "HTTP/1.1 {} ", status.as_str())?;
                dst.put_slice(reason);
                dst.put_slice(b"\r\n");
            }
        }

        let drop_framing = item.framing != Framing::AsIs;
        for (header_name, header_value) in item.headers {
            if drop_framing && is_framing_field(header_name) {
                continue;
            }
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }

        match item.framing {
            Framing::Length(n) => write!(FastWrite(dst), "content-length: {n}\r\n")?,
            Framing::Chunked => dst.put_slice(b"transfer-encoding: chunked\r\n"),
            Framing::AsIs | Framing::Implicit => {}
        }

        if let Some(value) = item.connection {
            let already_present =
                item.headers.get_all(CONNECTION).iter().any(|v| v.as_bytes().eq_ignore_ascii_case(value.as_bytes()));
            if !already_present {
                write!(FastWrite(dst), "connection: {value}\r\n")?;
            }
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Encodes the header fields of a trailer section, without the terminating blank line.
pub(crate) fn encode_fields(fields: &HeaderMap, dst: &mut BytesMut) {
    for (name, value) in fields {
        dst.put_slice(name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(value.as_ref());
        dst.put_slice(b"\r\n");
    }
}

fn is_framing_field(name: &HeaderName) -> bool {
    name == CONTENT_LENGTH || name == TRANSFER_ENCODING
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
