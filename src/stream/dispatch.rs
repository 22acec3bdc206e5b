// Typed events and the listener they are delivered to

use serde_json::Value;

use super::record::{EventKind, Record};
use crate::models::{DoneMetadata, Source};

const UNKNOWN_ERROR: &str = "Unknown error";

/// One decoded record of the reply stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Full snapshot of the retrieved sources; replaces any earlier one
    Sources(Vec<Source>),
    /// Incremental reasoning token
    Thinking(String),
    /// Incremental answer token
    Answer(String),
    Done(DoneMetadata),
    Error(String),
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// Entries that do not look like a source descriptor are skipped
fn sources_field(payload: &Value) -> Vec<Source> {
    let Some(entries) = payload.get("sources").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Source>(entry.clone()) {
            Ok(source) => Some(source),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed source entry");
                None
            }
        })
        .collect()
}

fn done_metadata(payload: &Value) -> DoneMetadata {
    DoneMetadata {
        model: str_field(payload, "model").map(ToString::to_string),
        context_used: payload.get("context_used").and_then(Value::as_u64),
    }
}

impl StreamEvent {
    /// Extract the typed fields for a record's kind.
    ///
    /// Once the kind is known the record is never dropped: fields that are
    /// absent, null or of the wrong JSON type take their defaults.
    pub fn decode(record: Record) -> Self {
        let Record { kind, payload } = record;
        match kind {
            EventKind::Sources => Self::Sources(sources_field(&payload)),
            EventKind::Thinking => {
                Self::Thinking(str_field(&payload, "content").unwrap_or_default().to_string())
            }
            EventKind::Answer => {
                Self::Answer(str_field(&payload, "content").unwrap_or_default().to_string())
            }
            EventKind::Done => Self::Done(done_metadata(&payload)),
            EventKind::Error => {
                Self::Error(str_field(&payload, "detail").unwrap_or(UNKNOWN_ERROR).to_string())
            }
        }
    }

    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Sources(_) => EventKind::Sources,
            Self::Thinking(_) => EventKind::Thinking,
            Self::Answer(_) => EventKind::Answer,
            Self::Done(_) => EventKind::Done,
            Self::Error(_) => EventKind::Error,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}

/// Receives the reply stream one event at a time.
///
/// Calls happen synchronously inside the read loop, in wire order, so an
/// implementation must not block for long.
#[cfg_attr(test, mockall::automock)]
pub trait ChatListener {
    fn on_sources(&mut self, sources: Vec<Source>);
    fn on_thinking(&mut self, token: String);
    fn on_answer(&mut self, token: String);
    fn on_done(&mut self, metadata: DoneMetadata);
    fn on_error(&mut self, detail: String);
}

pub fn dispatch<L: ChatListener + ?Sized>(listener: &mut L, event: StreamEvent) {
    match event {
        StreamEvent::Sources(sources) => listener.on_sources(sources),
        StreamEvent::Thinking(token) => listener.on_thinking(token),
        StreamEvent::Answer(token) => listener.on_answer(token),
        StreamEvent::Done(metadata) => listener.on_done(metadata),
        StreamEvent::Error(detail) => listener.on_error(detail),
    }
}
