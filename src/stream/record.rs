// Prefix grammar for event-framed lines

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// The closed set of record kinds the backend emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Sources,
    Thinking,
    Answer,
    Done,
    Error,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sources => "sources",
            Self::Thinking => "thinking",
            Self::Answer => "answer",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// `done` and `error` end the logical exchange
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sources" => Ok(Self::Sources),
            "thinking" => Ok(Self::Thinking),
            "answer" => Ok(Self::Answer),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            other => Err(UnknownEventKind(other.to_string())),
        }
    }
}

/// How a single line is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Event(&'a str),
    Data(&'a str),
    Blank,
    Other,
}

pub fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(value) = field_value(line, "event:") {
        return LineKind::Event(value.trim());
    }
    if let Some(value) = field_value(line, "data:") {
        return LineKind::Data(value);
    }
    LineKind::Other
}

fn field_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let value = line.strip_prefix(prefix)?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// A decoded `data:` payload together with the kind announced before it
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: EventKind,
    pub payload: Value,
}

/// Tracks the event type of the record in progress.
///
/// Each `data:` line is handed out as soon as it decodes; payloads are not
/// concatenated across several data lines.
#[derive(Debug, Default)]
pub struct RecordParser {
    event_type: Option<EventKind>,
}

impl RecordParser {
    pub const fn new() -> Self {
        Self { event_type: None }
    }

    pub const fn current(&self) -> Option<EventKind> {
        self.event_type
    }

    /// Feed one line, returning a record when a data line decodes
    pub fn feed(&mut self, line: &str) -> Option<Record> {
        match classify(line) {
            LineKind::Blank => {
                self.event_type = None;
                None
            }
            LineKind::Event(name) => {
                self.event_type = match name.parse::<EventKind>() {
                    Ok(kind) => Some(kind),
                    Err(UnknownEventKind(name)) => {
                        tracing::debug!(event = %name, "ignoring unknown event kind");
                        None
                    }
                };
                None
            }
            LineKind::Data(raw) => {
                let Some(kind) = self.event_type else {
                    tracing::debug!("dropping data line without a preceding event line");
                    return None;
                };
                match serde_json::from_str::<Value>(raw) {
                    Ok(payload) => Some(Record { kind, payload }),
                    Err(err) => {
                        tracing::debug!(%kind, error = %err, "dropping malformed payload");
                        None
                    }
                }
            }
            LineKind::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(classify("event: answer"), LineKind::Event("answer"));
        assert_eq!(classify("event:answer"), LineKind::Event("answer"));
        assert_eq!(classify("data: {\"a\":1}"), LineKind::Data("{\"a\":1}"));
        assert_eq!(classify("data:{}"), LineKind::Data("{}"));
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify(": keep-alive"), LineKind::Other);
        assert_eq!(classify("id: 7"), LineKind::Other);
    }

    #[test]
    fn test_event_kind_parse() {
        assert_eq!("sources".parse::<EventKind>(), Ok(EventKind::Sources));
        assert_eq!("done".parse::<EventKind>(), Ok(EventKind::Done));
        assert_eq!(
            "usage".parse::<EventKind>(),
            Err(UnknownEventKind("usage".to_string()))
        );
        assert!(EventKind::Error.is_terminal());
        assert!(!EventKind::Answer.is_terminal());
    }

    #[test]
    fn test_event_then_data_yields_record() {
        let mut parser = RecordParser::new();
        assert_eq!(parser.feed("event: thinking"), None);
        assert_eq!(parser.current(), Some(EventKind::Thinking));

        let record = parser.feed(r#"data: {"content":"A"}"#);
        assert_eq!(
            record,
            Some(Record {
                kind: EventKind::Thinking,
                payload: json!({"content": "A"}),
            })
        );
    }

    #[test]
    fn test_each_data_line_dispatches() {
        let mut parser = RecordParser::new();
        parser.feed("event: answer");
        assert!(parser.feed(r#"data: {"content":"A"}"#).is_some());
        assert!(parser.feed(r#"data: {"content":"B"}"#).is_some());
    }

    #[test]
    fn test_data_without_event_is_dropped() {
        let mut parser = RecordParser::new();
        assert_eq!(parser.feed(r#"data: {"content":"A"}"#), None);
    }

    #[test]
    fn test_blank_line_resets_event_type() {
        let mut parser = RecordParser::new();
        parser.feed("event: answer");
        parser.feed("");
        assert_eq!(parser.current(), None);
        assert_eq!(parser.feed(r#"data: {"content":"A"}"#), None);
    }

    #[test]
    fn test_later_event_line_overwrites() {
        let mut parser = RecordParser::new();
        parser.feed("event: thinking");
        parser.feed("event: answer");
        let record = parser.feed(r#"data: {"content":"B"}"#).unwrap();
        assert_eq!(record.kind, EventKind::Answer);
    }

    #[test]
    fn test_unknown_event_clears_type() {
        let mut parser = RecordParser::new();
        parser.feed("event: answer");
        parser.feed("event: heartbeat");
        assert_eq!(parser.current(), None);
        assert_eq!(parser.feed("data: {}"), None);
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let mut parser = RecordParser::new();
        parser.feed("event: answer");
        assert_eq!(parser.feed("data: {not json"), None);
        // Type survives, so the next good line still dispatches
        assert!(parser.feed(r#"data: {"content":"ok"}"#).is_some());
    }

    #[test]
    fn test_other_lines_ignored() {
        let mut parser = RecordParser::new();
        parser.feed("event: done");
        assert_eq!(parser.feed(": comment"), None);
        assert_eq!(parser.feed("retry: 1000"), None);
        assert_eq!(parser.current(), Some(EventKind::Done));
    }
}
