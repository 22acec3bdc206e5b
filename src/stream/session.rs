// One question/response exchange: read loop plus exactly-once completion

use bytes::Bytes;
use futures::stream::Stream;
use tracing::Instrument;
use uuid::Uuid;

use super::dispatch::{dispatch, ChatListener, StreamEvent};
use super::error::{BoxError, StreamError};
use super::framer::LineFramer;
use super::record::{EventKind, RecordParser};
use crate::api::transport::ChunkReader;
use crate::models::DoneMetadata;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Synthesize an empty `done` when the caller cancels mid-stream
    pub complete_on_cancel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    NotSent,
    Sent,
}

/// How a session that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The server sent a `done` record
    Done,
    /// The server sent an `error` record
    Error,
    /// The stream ended without a terminal record; an empty `done` was sent
    Synthesized,
}

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    Terminal(EventKind),
    EndOfStream,
}

/// Per-exchange decoder state, threaded through the read loop.
///
/// Owns the line buffer, the record in progress and the terminal flag; never
/// shared between exchanges.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    options: SessionOptions,
    framer: LineFramer,
    parser: RecordParser,
    terminal: TerminalState,
    dispatched: usize,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            options,
            framer: LineFramer::new(),
            parser: RecordParser::new(),
            terminal: TerminalState::NotSent,
            dispatched: 0,
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    pub const fn terminal(&self) -> TerminalState {
        self.terminal
    }

    /// Drive a reader to its end and apply the completion guarantee.
    ///
    /// `opened` is the result of opening the transport, so failures that
    /// happen before the first chunk go through the same finalizer.
    pub async fn run<S, E, L>(
        mut self,
        opened: Result<ChunkReader<S>, StreamError>,
        listener: &mut L,
    ) -> Result<Completion, StreamError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<BoxError>,
        L: ChatListener + ?Sized,
    {
        let span = tracing::debug_span!("chat_stream", session = %self.id);
        let exit = match opened {
            Ok(mut reader) => self.read_loop(&mut reader, listener).instrument(span.clone()).await,
            Err(err) => Err(err),
        };
        span.in_scope(|| self.finish(exit, listener))
    }

    async fn read_loop<S, E, L>(
        &mut self,
        reader: &mut ChunkReader<S>,
        listener: &mut L,
    ) -> Result<LoopExit, StreamError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<BoxError>,
        L: ChatListener + ?Sized,
    {
        while let Some(chunk) = reader.next().await? {
            for line in self.framer.push(&chunk) {
                if let Some(kind) = self.handle_line(&line, listener) {
                    return Ok(LoopExit::Terminal(kind));
                }
            }
        }

        // A last record without a trailing newline still counts
        for line in self.framer.finish() {
            if let Some(kind) = self.handle_line(&line, listener) {
                return Ok(LoopExit::Terminal(kind));
            }
        }
        Ok(LoopExit::EndOfStream)
    }

    /// Returns the kind of a terminal record once one has been dispatched
    fn handle_line<L: ChatListener + ?Sized>(&mut self, line: &str, listener: &mut L) -> Option<EventKind> {
        if self.terminal == TerminalState::Sent {
            return None;
        }

        let record = self.parser.feed(line)?;
        let kind = record.kind;
        let event = StreamEvent::decode(record);

        let terminal = event.is_terminal();
        if terminal {
            self.terminal = TerminalState::Sent;
        }
        dispatch(listener, event);
        self.dispatched += 1;

        terminal.then_some(kind)
    }

    /// The finalizer every exit path goes through; dispatches at most once
    fn finish<L: ChatListener + ?Sized>(
        &mut self,
        exit: Result<LoopExit, StreamError>,
        listener: &mut L,
    ) -> Result<Completion, StreamError> {
        match exit {
            Ok(LoopExit::Terminal(kind)) => {
                tracing::info!(%kind, events = self.dispatched, "stream ended by server");
                Ok(if kind == EventKind::Error {
                    Completion::Error
                } else {
                    Completion::Done
                })
            }
            Ok(LoopExit::EndOfStream) => {
                self.send_done_once(listener);
                tracing::info!(events = self.dispatched, "stream ended without terminal record");
                Ok(Completion::Synthesized)
            }
            Err(StreamError::Cancelled) => {
                let dropped = self.framer.discard();
                tracing::info!(events = self.dispatched, dropped, "stream cancelled");
                if self.options.complete_on_cancel {
                    self.send_done_once(listener);
                }
                Err(StreamError::Cancelled)
            }
            Err(err) => {
                tracing::warn!(error = %err, "stream failed");
                if self.terminal == TerminalState::NotSent {
                    self.terminal = TerminalState::Sent;
                    listener.on_error(err.to_string());
                }
                Err(err)
            }
        }
    }

    fn send_done_once<L: ChatListener + ?Sized>(&mut self, listener: &mut L) {
        if self.terminal == TerminalState::NotSent {
            self.terminal = TerminalState::Sent;
            listener.on_done(DoneMetadata::default());
        }
    }
}
