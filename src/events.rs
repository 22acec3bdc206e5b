// Event types for async communication

use tokio::sync::mpsc::UnboundedSender;

use crate::models::{DoneMetadata, Source};
use crate::stream::ChatListener;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Latest snapshot of the retrieved sources
    Sources(Vec<Source>),
    /// A reasoning token
    Thinking(String),
    /// An answer token
    Answer(String),
    /// The reply completed
    Done(DoneMetadata),
    /// The backend or the transport failed
    Error(String),
}

/// Identifies one question/response exchange within the UI session
pub type ExchangeId = u64;

/// An [`AppEvent`] tagged with the exchange that produced it.
///
/// Every exchange shares one channel, so a task that is still winding down
/// after an abort can deliver events while the next exchange is running.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeEvent {
    pub exchange: ExchangeId,
    pub event: AppEvent,
}

/// Forwards stream callbacks to the UI loop over a channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    exchange: ExchangeId,
    tx: UnboundedSender<ExchangeEvent>,
}

impl ChannelListener {
    pub const fn new(exchange: ExchangeId, tx: UnboundedSender<ExchangeEvent>) -> Self {
        Self { exchange, tx }
    }

    fn forward(&self, event: AppEvent) {
        let tagged = ExchangeEvent {
            exchange: self.exchange,
            event,
        };
        // The UI may already have shut down; nothing left to notify then
        if self.tx.send(tagged).is_err() {
            tracing::debug!("ui channel closed, dropping stream event");
        }
    }
}

impl ChatListener for ChannelListener {
    fn on_sources(&mut self, sources: Vec<Source>) {
        self.forward(AppEvent::Sources(sources));
    }

    fn on_thinking(&mut self, token: String) {
        self.forward(AppEvent::Thinking(token));
    }

    fn on_answer(&mut self, token: String) {
        self.forward(AppEvent::Answer(token));
    }

    fn on_done(&mut self, metadata: DoneMetadata) {
        self.forward(AppEvent::Done(metadata));
    }

    fn on_error(&mut self, detail: String) {
        self.forward(AppEvent::Error(detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_listener_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listener = ChannelListener::new(7, tx);

        listener.on_sources(vec![Source::default()]);
        listener.on_thinking("hmm".to_string());
        listener.on_answer("Yes".to_string());
        listener.on_done(DoneMetadata::default());

        let expected = [
            AppEvent::Sources(vec![Source::default()]),
            AppEvent::Thinking("hmm".to_string()),
            AppEvent::Answer("Yes".to_string()),
            AppEvent::Done(DoneMetadata::default()),
        ];
        for event in expected {
            assert_eq!(rx.try_recv().unwrap(), ExchangeEvent { exchange: 7, event });
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_listener_survives_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut listener = ChannelListener::new(1, tx);
        listener.on_error("late".to_string());
    }
}
