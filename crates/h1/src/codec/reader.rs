//! The resumable tokenizer shared by [`RequestReader`](super::RequestReader) and
//! [`ResponseReader`](super::ResponseReader).
//!
//! A reader only keeps its position in the grammar and some per-message scratch, never the
//! bytes themselves. Each window handed to [`TokenReader::set_buffer`] must start with the
//! bytes that were not committed yet; [`Tokens::parsed_count`] tells how many leading bytes
//! of the window have been committed and can be dropped.
//!
//! Tokens partition the message: every byte belongs to exactly one token, separators and
//! line endings being [`Code::Skip`] tokens. A token that does not fit in the window reads as
//! [`Code::Insufficient`] and is matched again, from its first byte, against the next window.

use crate::codec::body::{match_chunk_ext, match_chunk_size, LengthDecoder};
use crate::codec::header::{
    match_field_name, match_field_separator, match_field_value, trimmed_len, BodyType, FieldKind, FramingFields,
};
use crate::codec::request_reader::match_request_target;
use crate::codec::response_reader::match_status_code;
use crate::codec::syntax::{match_crlf, match_http_version, match_sp, match_token_until, Match, VERSION_LEN};
use crate::codec::{Code, Token};
use crate::protocol::ParseError;
use http::Method;
use tracing::trace;

/// Which side of the exchange is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Request,
    Response,
}

/// Method of the request a response answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestMethod {
    Unset,
    Head,
    Connect,
    Other,
}

impl From<&Method> for RequestMethod {
    fn from(method: &Method) -> Self {
        if method == Method::HEAD {
            RequestMethod::Head
        } else if method == Method::CONNECT {
            RequestMethod::Connect
        } else {
            RequestMethod::Other
        }
    }
}

/// Grammar position: the kind of token matched at the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Request: empty lines or the method. Response: the version.
    MessageStart,
    MethodSp,
    Target,
    TargetSp,
    RequestVersion,
    VersionSp,
    StatusCode,
    /// SP before the reason phrase, or the CR of a status line without one.
    StatusSp,
    ReasonPhrase,
    StartLineEnd,
    /// A field name or the empty line ending the header section.
    Field,
    FieldSeparator,
    FieldValue,
    FieldEnd,
    LengthBody,
    DelimitedBody,
    ChunkSize,
    ChunkExt,
    ChunkSizeEnd,
    ChunkData,
    ChunkDataEnd,
    /// A trailer name or the empty line ending the message.
    Trailer,
    TrailerSeparator,
    TrailerValue,
    TrailerEnd,
    EmptyBody,
    MessageEnd,
    /// The connection was handed over to another protocol.
    Tunnel,
}

/// Parser state of a reader.
#[derive(Debug, Clone)]
pub(crate) struct ReaderCore {
    mode: Mode,
    state: State,
    code: Code,
    /// Start of the current token in the window.
    idx: usize,
    size: usize,
    /// Value of the current token, relative to its start.
    value: (usize, usize),

    // per message
    version: u8,
    status: u16,
    field: FieldKind,
    framing: FramingFields,
    has_host: bool,
    body: BodyType,
    resolved: (BodyType, u64),
    length: LengthDecoder,
    chunk_extensions: bool,
    tunnel: bool,

    // per connection
    method: RequestMethod,
    eof: bool,
}

impl ReaderCore {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            state: State::MessageStart,
            code: Code::Insufficient,
            idx: 0,
            size: 0,
            value: (0, 0),
            version: 1,
            status: 0,
            field: FieldKind::Other,
            framing: FramingFields::default(),
            has_host: false,
            body: BodyType::Unknown,
            resolved: (BodyType::Unknown, 0),
            length: LengthDecoder::default(),
            chunk_extensions: false,
            tunnel: false,
            method: RequestMethod::Unset,
            eof: false,
        }
    }

    pub(crate) fn code(&self) -> Code {
        self.code
    }

    pub(crate) fn body_type(&self) -> BodyType {
        self.body
    }

    pub(crate) fn set_method(&mut self, method: RequestMethod) {
        self.method = method;
    }

    pub(crate) fn puteof(&mut self) {
        self.eof = true;
    }

    /// Returns true when nothing of the next message has been committed yet.
    pub(crate) fn is_message_start(&self) -> bool {
        self.state == State::MessageStart || self.code == Code::EndOfMessage
    }

    /// Forgets everything, including the method set on a response reader and end-of-stream.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    pub(crate) fn expected_token(&self) -> Code {
        match self.state {
            State::MessageStart => match self.mode {
                Mode::Request => Code::Method,
                Mode::Response => Code::Version,
            },
            State::Target => Code::RequestTarget,
            State::RequestVersion => Code::Version,
            State::StatusCode => Code::StatusCode,
            State::StatusSp | State::ReasonPhrase => Code::ReasonPhrase,
            State::Field => Code::FieldName,
            State::FieldValue => Code::FieldValue,
            State::ChunkExt => Code::ChunkExt,
            State::LengthBody | State::DelimitedBody | State::ChunkData => Code::BodyChunk,
            State::Trailer => Code::TrailerName,
            State::TrailerValue => Code::TrailerValue,
            State::EmptyBody => Code::EndOfBody,
            State::MessageEnd => Code::EndOfMessage,
            State::Tunnel => Code::Error(ParseError::UseAnotherConnection),
            State::MethodSp
            | State::TargetSp
            | State::VersionSp
            | State::StartLineEnd
            | State::FieldSeparator
            | State::FieldEnd
            | State::ChunkSize
            | State::ChunkSizeEnd
            | State::ChunkDataEnd
            | State::TrailerSeparator
            | State::TrailerEnd => Code::Skip,
        }
    }

    /// Starts over on a new window whose first byte is the first uncommitted byte.
    pub(crate) fn set_buffer(&mut self, window: &[u8]) {
        self.idx = 0;
        if self.code == Code::Insufficient {
            self.matches(window);
        }
    }

    /// Commits the current token and matches the following one.
    ///
    /// Does nothing after an error; an incomplete token is matched again.
    pub(crate) fn next(&mut self, window: &[u8]) {
        match self.code {
            Code::Error(_) => return,
            Code::Insufficient => {}
            _ => {
                self.commit(window);
                self.idx += self.size;
            }
        }
        self.matches(window);
    }

    fn emit(&mut self, code: Code, size: usize) {
        self.code = code;
        self.size = size;
        self.value = (0, size);
    }

    fn starve(&mut self, matched: usize) {
        self.code = Code::Insufficient;
        self.size = matched;
    }

    fn fail(&mut self, e: ParseError) {
        self.code = Code::Error(e);
        self.size = 0;
    }

    fn on_match(&mut self, m: Match, code: Code, available: usize) {
        match m {
            Match::Complete(n) => self.emit(code, n),
            Match::Partial => self.starve(available),
            Match::Invalid(e) => self.fail(e),
        }
    }

    fn end_of_message(&mut self, size: usize) {
        self.emit(Code::EndOfMessage, size);
        // interim responses keep the method for the final one
        if self.mode == Mode::Response && !self.is_interim() {
            self.method = RequestMethod::Unset;
        }
    }

    fn is_interim(&self) -> bool {
        (100..200).contains(&self.status) && self.status != 101
    }

    /// Resolves the body of the message whose header section just ended.
    fn classify(&self) -> Result<(BodyType, u64), ParseError> {
        match self.mode {
            Mode::Request => {
                if self.version >= 1 && !self.has_host {
                    return Err(ParseError::NoHost);
                }
                self.framing.classify(false, false)
            }
            Mode::Response => {
                let status = self.status;
                let connect_success = self.method == RequestMethod::Connect && (200..300).contains(&status);
                let body_forbidden = self.method == RequestMethod::Head
                    || (100..200).contains(&status)
                    || status == 204
                    || status == 304
                    || connect_success;
                self.framing.classify(body_forbidden, self.version == 0)
            }
        }
    }

    fn matches(&mut self, window: &[u8]) {
        let rest = window.get(self.idx..).unwrap_or_default();
        let available = rest.len();

        match self.state {
            State::MessageStart => match self.mode {
                Mode::Request if rest.first() == Some(&b'\r') => self.on_match(match_crlf(rest), Code::Skip, available),
                Mode::Request => self.on_match(match_token_until(rest, b' '), Code::Method, available),
                Mode::Response if self.method == RequestMethod::Unset => self.fail(ParseError::MethodNotSet),
                Mode::Response => self.version_token(rest),
            },
            State::MethodSp | State::TargetSp | State::VersionSp => {
                self.on_match(match_sp(rest), Code::Skip, available);
            }
            State::Target => self.on_match(match_request_target(rest), Code::RequestTarget, available),
            State::RequestVersion => self.version_token(rest),
            State::StatusCode => match match_status_code(rest) {
                Ok(Some(status)) => {
                    self.status = status;
                    self.emit(Code::StatusCode, 3);
                }
                Ok(None) => self.starve(available),
                Err(e) => self.fail(e),
            },
            State::StatusSp => match rest.first() {
                None => self.starve(0),
                Some(b' ') => self.emit(Code::Skip, 1),
                Some(b'\r') => self.emit(Code::ReasonPhrase, 0),
                Some(_) => self.fail(ParseError::InvalidData),
            },
            State::ReasonPhrase => self.on_match(match_field_value(rest), Code::ReasonPhrase, available),
            State::StartLineEnd
            | State::FieldEnd
            | State::ChunkDataEnd
            | State::TrailerEnd => self.on_match(match_crlf(rest), Code::Skip, available),
            State::Field => match rest.first() {
                Some(b'\r') => match match_crlf(rest) {
                    Match::Complete(n) => match self.classify() {
                        Ok(resolved) => {
                            self.resolved = resolved;
                            self.emit(Code::EndOfHeaders, n);
                        }
                        Err(e) => self.fail(e),
                    },
                    m => self.on_match(m, Code::EndOfHeaders, available),
                },
                _ => self.on_match(match_field_name(rest), Code::FieldName, available),
            },
            State::FieldSeparator | State::TrailerSeparator => {
                self.on_match(match_field_separator(rest), Code::Skip, available);
            }
            State::FieldValue => self.field_value(rest, Code::FieldValue),
            State::TrailerValue => self.field_value(rest, Code::TrailerValue),
            State::LengthBody => {
                if self.length.is_done() {
                    self.emit(Code::EndOfBody, 0);
                } else if rest.is_empty() {
                    self.starve(0);
                } else {
                    self.emit(Code::BodyChunk, self.length.next_chunk(available));
                }
            }
            State::DelimitedBody => {
                if !rest.is_empty() {
                    self.emit(Code::BodyChunk, available);
                } else if self.eof {
                    self.emit(Code::EndOfBody, 0);
                } else {
                    self.starve(0);
                }
            }
            State::ChunkSize => match match_chunk_size(rest) {
                Ok(Some(chunk_size)) => {
                    self.length = LengthDecoder::new(chunk_size.size);
                    self.chunk_extensions = chunk_size.extensions;
                    self.emit(Code::Skip, chunk_size.len);
                }
                Ok(None) => self.starve(available),
                Err(e) => self.fail(e),
            },
            State::ChunkExt => self.on_match(match_chunk_ext(rest), Code::ChunkExt, available),
            State::ChunkSizeEnd => {
                let code = if self.length.is_done() { Code::EndOfBody } else { Code::Skip };
                self.on_match(match_crlf(rest), code, available);
            }
            State::ChunkData => {
                if rest.is_empty() {
                    self.starve(0);
                } else {
                    self.emit(Code::BodyChunk, self.length.next_chunk(available));
                }
            }
            State::Trailer => match rest.first() {
                Some(b'\r') => match match_crlf(rest) {
                    Match::Complete(n) => self.end_of_message(n),
                    m => self.on_match(m, Code::EndOfMessage, available),
                },
                _ => self.on_match(match_field_name(rest), Code::TrailerName, available),
            },
            State::EmptyBody => self.emit(Code::EndOfBody, 0),
            State::MessageEnd => self.end_of_message(0),
            State::Tunnel => self.fail(ParseError::UseAnotherConnection),
        }

        trace!(state = ?self.state, code = ?self.code, size = self.size, "matched token");
    }

    fn version_token(&mut self, rest: &[u8]) {
        match match_http_version(rest) {
            Ok(Some(version)) => {
                self.version = version;
                self.emit(Code::Version, VERSION_LEN);
            }
            Ok(None) => self.starve(rest.len()),
            Err(e) => self.fail(e),
        }
    }

    fn field_value(&mut self, rest: &[u8], code: Code) {
        match match_field_value(rest) {
            Match::Complete(n) => {
                self.emit(code, n);
                self.value = (0, trimmed_len(&rest[..n]));
            }
            m => self.on_match(m, code, rest.len()),
        }
    }

    /// Applies the effects of the current, complete token and moves to the next state.
    fn commit(&mut self, window: &[u8]) {
        let token = window.get(self.idx..self.idx + self.size).unwrap_or_default();

        self.state = match (self.state, self.code) {
            (State::MessageStart, Code::Skip) => State::MessageStart,
            (State::MessageStart, Code::Method) => State::MethodSp,
            (State::MessageStart, _) => State::VersionSp,
            (State::MethodSp, _) => State::Target,
            (State::Target, _) => State::TargetSp,
            (State::TargetSp, _) => State::RequestVersion,
            (State::RequestVersion, _) | (State::StatusSp, Code::ReasonPhrase) | (State::ReasonPhrase, _) => {
                State::StartLineEnd
            }
            (State::VersionSp, _) => State::StatusCode,
            (State::StatusCode, _) => State::StatusSp,
            (State::StatusSp, _) => State::ReasonPhrase,
            (State::StartLineEnd | State::FieldEnd, _) => State::Field,
            (State::Field, Code::EndOfHeaders) => self.start_body(),
            (State::Field, _) => {
                self.field = FieldKind::of(token);
                State::FieldSeparator
            }
            (State::FieldSeparator, _) => State::FieldValue,
            (State::FieldValue, _) => {
                self.on_field_value(&token[self.value.0..self.value.1]);
                State::FieldEnd
            }
            (State::LengthBody, Code::BodyChunk) => {
                self.length.consume(self.size);
                State::LengthBody
            }
            (State::DelimitedBody, Code::BodyChunk) => State::DelimitedBody,
            (State::LengthBody | State::DelimitedBody | State::EmptyBody, _) => State::MessageEnd,
            (State::ChunkSize, _) if self.chunk_extensions => State::ChunkExt,
            (State::ChunkSize | State::ChunkExt, _) => State::ChunkSizeEnd,
            (State::ChunkSizeEnd, Code::EndOfBody) => State::Trailer,
            (State::ChunkSizeEnd, _) => State::ChunkData,
            (State::ChunkData, _) => {
                self.length.consume(self.size);
                if self.length.is_done() {
                    State::ChunkDataEnd
                } else {
                    State::ChunkData
                }
            }
            (State::ChunkDataEnd, _) => State::ChunkSize,
            (State::Trailer, Code::TrailerName) => State::TrailerSeparator,
            (State::TrailerSeparator, _) => State::TrailerValue,
            (State::TrailerValue, _) => State::TrailerEnd,
            (State::TrailerEnd, _) => State::Trailer,
            (State::Trailer | State::MessageEnd, _) => self.finish_message(),
            (State::Tunnel, _) => State::Tunnel,
        };
    }

    fn on_field_value(&mut self, value: &[u8]) {
        match self.field {
            FieldKind::ContentLength => self.framing.on_content_length(value),
            FieldKind::TransferEncoding => self.framing.on_transfer_encoding(value),
            FieldKind::Host => self.has_host = true,
            FieldKind::Other => return,
        }
        self.body = self.framing.pending();
    }

    fn start_body(&mut self) -> State {
        let (body, length) = self.resolved;
        self.body = body;
        self.length = LengthDecoder::new(length);
        self.tunnel = self.mode == Mode::Response
            && (self.status == 101 || (self.method == RequestMethod::Connect && (200..300).contains(&self.status)));

        trace!(body_type = ?body, length, "header section complete");
        match body {
            BodyType::ContentLength => State::LengthBody,
            BodyType::Chunked => State::ChunkSize,
            BodyType::ConnectionDelimited => State::DelimitedBody,
            BodyType::NoBody
            | BodyType::Unknown
            | BodyType::ContentLengthPending
            | BodyType::ChunkedPending => State::EmptyBody,
        }
    }

    fn finish_message(&mut self) -> State {
        if self.tunnel {
            return State::Tunnel;
        }

        self.version = 1;
        self.status = 0;
        self.field = FieldKind::Other;
        self.framing = FramingFields::default();
        self.has_host = false;
        self.body = BodyType::Unknown;
        self.resolved = (BodyType::Unknown, 0);
        self.length = LengthDecoder::default();
        self.chunk_extensions = false;
        State::MessageStart
    }
}

/// A cursor over the tokens of one window.
///
/// Returned by [`TokenReader::set_buffer`]. Token values borrow the cursor, so none can be
/// held across [`next`](Self::next) or a mutation of the window; the reader itself is borrowed
/// by the cursor and only keeps its parser state once the cursor is dropped.
///
/// Field and trailer names are lowercased in the window as soon as they are matched.
#[derive(Debug)]
pub struct Tokens<'r, 'w> {
    core: &'r mut ReaderCore,
    window: &'w mut [u8],
}

impl<'r, 'w> Tokens<'r, 'w> {
    pub(crate) fn new(core: &'r mut ReaderCore, window: &'w mut [u8]) -> Self {
        core.set_buffer(&*window);
        let mut tokens = Self { core, window };
        tokens.normalize();
        tokens
    }

    fn normalize(&mut self) {
        if matches!(self.core.code, Code::FieldName | Code::TrailerName) {
            let start = self.core.idx;
            if let Some(name) = self.window.get_mut(start..start + self.core.size) {
                name.make_ascii_lowercase();
            }
        }
    }

    /// The kind of the current token.
    pub fn code(&self) -> Code {
        self.core.code
    }

    /// The current token with its value, `None` while it is incomplete or after an error.
    pub fn token(&self) -> Option<Token<'_>> {
        let start = self.core.idx;
        let bytes = self.window.get(start..start + self.core.size)?;
        let value = bytes.get(self.core.value.0..self.core.value.1)?;

        let token = match self.core.code {
            Code::Insufficient | Code::Error(_) => return None,
            Code::Skip => Token::Skip,
            Code::Method => Token::Method(std::str::from_utf8(value).ok()?),
            Code::RequestTarget => Token::RequestTarget(std::str::from_utf8(value).ok()?),
            Code::Version => Token::Version(self.core.version),
            Code::StatusCode => Token::StatusCode(self.core.status),
            Code::ReasonPhrase => Token::ReasonPhrase(value),
            Code::FieldName => Token::FieldName(std::str::from_utf8(value).ok()?),
            Code::FieldValue => Token::FieldValue(value),
            Code::EndOfHeaders => Token::EndOfHeaders,
            Code::ChunkExt => Token::ChunkExt(value),
            Code::BodyChunk => Token::BodyChunk(value),
            Code::EndOfBody => Token::EndOfBody,
            Code::TrailerName => Token::TrailerName(std::str::from_utf8(value).ok()?),
            Code::TrailerValue => Token::TrailerValue(value),
            Code::EndOfMessage => Token::EndOfMessage,
        };
        Some(token)
    }

    /// Size of the current token; while it is incomplete, the bytes matched so far.
    pub fn token_size(&self) -> usize {
        self.core.size
    }

    /// Bytes at the front of the window committed by [`next`](Self::next).
    ///
    /// The next window must start at this offset of the current one.
    pub fn parsed_count(&self) -> usize {
        self.core.idx
    }

    /// The kind of token expected at the current position.
    ///
    /// Meant for a caller that cannot grow its buffer while the reader reports
    /// [`Code::Insufficient`].
    pub fn expected_token(&self) -> Code {
        self.core.expected_token()
    }

    /// Commits the current token and matches the following one.
    ///
    /// After [`Code::EndOfMessage`] this starts the next message. Errors are sticky: once
    /// [`code`](Self::code) is an error, only [`TokenReader::reset`] clears it.
    pub fn next(&mut self) {
        self.core.next(&*self.window);
        self.normalize();
    }
}

/// Operations common to [`RequestReader`](super::RequestReader) and
/// [`ResponseReader`](super::ResponseReader).
pub trait TokenReader {
    /// Supplies the next window.
    ///
    /// The window must start with every byte that was not committed yet, that is the bytes
    /// from [`Tokens::parsed_count`] of the previous window onwards. The window is borrowed
    /// mutably because field names are lowercased in place.
    fn set_buffer<'r, 'w>(&'r mut self, window: &'w mut [u8]) -> Tokens<'r, 'w>;

    /// The kind of the current token.
    fn code(&self) -> Code;

    /// The kind of token expected at the current position.
    fn expected_token(&self) -> Code;

    /// Returns true when no byte of the next message has been committed.
    fn is_message_start(&self) -> bool;

    /// Signals that the transport reached end-of-stream.
    fn puteof(&mut self);

    /// Forgets all parser state.
    fn reset(&mut self);
}
