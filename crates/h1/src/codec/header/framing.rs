//! Body classification from the framing header fields.
//!
//! `Content-Length` and `Transfer-Encoding` values are folded into [`FramingFields`] as
//! they are tokenized. Once the header section ends, [`FramingFields::classify`] decides
//! the body type with this precedence:
//!
//! 1. a message that cannot have a body (HEAD response, 1xx / 204 / 304, 2xx to CONNECT)
//!    has none, whatever the headers say
//! 2. `Transfer-Encoding`: `chunked` must be the last coding and appear only once
//! 3. `Content-Length`: a base-10 integer that fits 64 bits
//! 4. an HTTP/1.0 response without framing is delimited by the end of the connection
//! 5. anything else has no body

use crate::protocol::ParseError;
use crate::utils::{header_list_elements, trim_ows};

/// Body classification of the message being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Headers not read yet.
    Unknown,
    /// The body ends when the transport reaches end-of-stream.
    ConnectionDelimited,
    NoBody,
    /// A valid `Content-Length` has been seen, the header section is not over yet.
    ContentLengthPending,
    /// `chunked` is currently the last transfer coding, the header section is not over yet.
    ChunkedPending,
    ContentLength,
    Chunked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TransferCoding {
    #[default]
    Absent,
    ChunkedLast,
    NotChunked,
    Invalid,
}

/// Framing-relevant header state accumulated over one header section.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FramingFields {
    content_length: Option<u64>,
    content_length_error: Option<ParseError>,
    transfer_coding: TransferCoding,
}

impl FramingFields {
    pub(crate) fn on_content_length(&mut self, value: &[u8]) {
        if self.content_length_error.is_some() {
            return;
        }

        match parse_content_length(value) {
            Ok(length) => match self.content_length {
                Some(previous) if previous != length => {
                    self.content_length_error = Some(ParseError::InvalidContentLength);
                }
                _ => self.content_length = Some(length),
            },
            Err(e) => self.content_length_error = Some(e),
        }
    }

    pub(crate) fn on_transfer_encoding(&mut self, value: &[u8]) {
        let mut any = false;
        for element in header_list_elements(value) {
            any = true;
            let coding = trim_ows(element.split(|b| *b == b';').next().unwrap_or_default());
            let chunked = coding.eq_ignore_ascii_case(b"chunked");

            self.transfer_coding = match (self.transfer_coding, chunked) {
                (TransferCoding::Invalid | TransferCoding::ChunkedLast, _) => TransferCoding::Invalid,
                (TransferCoding::Absent | TransferCoding::NotChunked, true) => TransferCoding::ChunkedLast,
                (TransferCoding::Absent | TransferCoding::NotChunked, false) => TransferCoding::NotChunked,
            };
        }

        if !any && self.transfer_coding == TransferCoding::Absent {
            self.transfer_coding = TransferCoding::NotChunked;
        }
    }

    /// The classification while the header section is still being read.
    pub(crate) fn pending(&self) -> BodyType {
        match (self.transfer_coding, self.content_length) {
            (TransferCoding::ChunkedLast, _) => BodyType::ChunkedPending,
            (TransferCoding::Absent, Some(_)) => BodyType::ContentLengthPending,
            _ => BodyType::Unknown,
        }
    }

    /// Resolves the body type once the header section is complete.
    ///
    /// Returns the body type and the content length to read.
    pub(crate) fn classify(&self, body_forbidden: bool, connection_delimited: bool) -> Result<(BodyType, u64), ParseError> {
        if body_forbidden {
            return Ok((BodyType::NoBody, 0));
        }

        match self.transfer_coding {
            TransferCoding::ChunkedLast => return Ok((BodyType::Chunked, 0)),
            TransferCoding::NotChunked | TransferCoding::Invalid => return Err(ParseError::InvalidTransferEncoding),
            TransferCoding::Absent => {}
        }

        if let Some(e) = self.content_length_error {
            return Err(e);
        }

        match self.content_length {
            Some(length) => Ok((BodyType::ContentLength, length)),
            None if connection_delimited => Ok((BodyType::ConnectionDelimited, 0)),
            None => Ok((BodyType::NoBody, 0)),
        }
    }
}

/// Parses a `Content-Length` value as a base-10 `u64`.
pub(crate) fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    if value.is_empty() {
        return Err(ParseError::InvalidContentLength);
    }

    let mut length: u64 = 0;
    for b in value {
        if !b.is_ascii_digit() {
            return Err(ParseError::InvalidContentLength);
        }
        length = length
            .checked_mul(10)
            .and_then(|n| n.checked_add(u64::from(b - b'0')))
            .ok_or(ParseError::ContentLengthOverflow)?;
    }
    Ok(length)
}
