use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::sync::{Mutex, MutexGuard, PoisonError};

use http::Method;
use tracing::trace;

use crate::ensure;
use crate::protocol::HttpError;

/// Progress of the message being read.
///
/// ```text
/// Empty -> MessageReady -> BodyReady -> Finished -> Empty
/// ```
///
/// A message without body goes from `Empty` to `Finished` in a single read of its head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadState {
    #[default]
    Empty,
    /// Start-line and header fields were read, the body is not complete.
    MessageReady,
    /// The body is complete, trailers are not read yet.
    BodyReady,
    Finished,
}

/// Progress of the message being written.
///
/// ```text
/// Empty -> [ContinueIssued ->] Finished -> Empty
/// Empty -> [ContinueIssued ->] MetadataIssued -> Finished -> Empty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteState {
    #[default]
    Empty,
    /// An interim `100 Continue` was written.
    ContinueIssued,
    /// The head was written, the body follows as chunks.
    MetadataIssued,
    Finished,
}

/// State both directions of a connection look at.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) read_state: ReadState,
    pub(crate) write_state: WriteState,
    pub(crate) open: bool,
    pub(crate) keep_alive: bool,
    pub(crate) peer_version: u8,
    pub(crate) stream_finished: bool,
    /// Server: method of the request being answered.
    pub(crate) request_method: Method,
    /// Client: methods of the requests written and not answered yet.
    pub(crate) pending_methods: VecDeque<Method>,
    /// A malformed message closed the connection, the stream is not shut down yet.
    pub(crate) shutdown_pending: bool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            read_state: ReadState::Empty,
            write_state: WriteState::Empty,
            open: true,
            keep_alive: true,
            peer_version: 1,
            stream_finished: false,
            request_method: Method::GET,
            pending_methods: VecDeque::new(),
            shutdown_pending: false,
        }
    }
}

impl Shared {
    pub(crate) fn ensure_open(&self) -> Result<(), HttpError> {
        ensure!(self.open, HttpError::io(io::Error::from(ErrorKind::NotConnected)));
        Ok(())
    }

    /// Starts over once both directions of an exchange are finished.
    pub(crate) fn settle(&mut self) {
        if self.read_state == ReadState::Finished && self.write_state == WriteState::Finished {
            trace!("exchange complete");
            self.read_state = ReadState::Empty;
            self.write_state = WriteState::Empty;
        }
    }

    pub(crate) fn mark_closed(&mut self) {
        self.open = false;
        self.read_state = ReadState::Empty;
        self.write_state = WriteState::Empty;
    }
}

/// The [`Shared`] state of a connection, locked for the synchronous steps between two
/// suspension points and never across one.
#[derive(Debug, Default)]
pub(crate) struct SharedState(Mutex<Shared>);

impl SharedState {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
