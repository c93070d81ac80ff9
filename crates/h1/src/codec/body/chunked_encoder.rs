use crate::codec::header::encode_fields;
use bytes::{BufMut, BytesMut};
use http::HeaderMap;
use std::io;
use std::io::Write;

use tokio_util::codec::Encoder;

/// One piece of a chunked body.
#[derive(Debug, Clone, Copy)]
pub enum ChunkItem<'a> {
    Data(&'a [u8]),
    /// The last chunk followed by a trailer section.
    Trailers(&'a HeaderMap),
    /// The last chunk with no trailers.
    Eof,
}

/// Encoder for `Transfer-Encoding: chunked` bodies.
///
/// Empty data is not written, a zero-size chunk would end the body. Once the last chunk
/// was encoded every further item is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Prepares for the body of the next message.
    pub fn reset(&mut self) {
        self.eof = false;
    }
}

impl Encoder<ChunkItem<'_>> for ChunkedEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: ChunkItem<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            ChunkItem::Data(bytes) if bytes.is_empty() => Ok(()),
            ChunkItem::Data(bytes) => {
                write!(helper::Writer(dst), "{:X}\r\n", bytes.len())?;
                dst.reserve(bytes.len() + 2);
                dst.extend_from_slice(bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            ChunkItem::Trailers(trailers) => {
                self.eof = true;
                dst.put_slice(b"0\r\n");
                encode_fields(trailers, dst);
                dst.put_slice(b"\r\n");
                Ok(())
            }
            ChunkItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
