use tokio_util::sync::CancellationToken;

use crate::events::{AppEvent, ExchangeEvent, ExchangeId};
use crate::models::{AppConfig, ChatRequest, ChatTurn, DoneMetadata, Message, Role, ThemeConfig};

/// A freshly started exchange, ready to be sent
#[derive(Debug)]
pub struct Exchange {
    pub id: ExchangeId,
    pub request: ChatRequest,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub messages: Vec<Message>,
    pub input_buffer: String,
    pub scroll_offset: usize,
    pub show_help: bool,
    pub is_loading: bool,
    pub show_info: bool,
    pub exit_pending: bool,
    pub endpoint: String,
    pub history_limit: usize,
    pub theme: ThemeConfig,

    // Metadata from the most recent completed reply
    pub last_done: Option<DoneMetadata>,
    cancel: Option<CancellationToken>,
    exchange: ExchangeId,

    // UI toggles
    pub show_thinking: bool,
    pub show_sources: bool,
}

impl App {
    pub fn new(config: &AppConfig, endpoint: String) -> Self {
        Self {
            should_quit: false,
            messages: Vec::new(),
            input_buffer: String::new(),
            scroll_offset: 0,
            show_help: false,
            is_loading: false,
            show_info: false,
            exit_pending: false,
            endpoint,
            history_limit: config.history_limit,
            theme: config.theme.clone(),
            last_done: None,
            cancel: None,
            exchange: 0,
            show_thinking: false,
            show_sources: true,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    pub const fn toggle_thinking(&mut self) {
        self.show_thinking = !self.show_thinking;
    }

    pub const fn toggle_sources(&mut self) {
        self.show_sources = !self.show_sources;
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // The renderer clamps this to the real maximum
        self.scroll_offset = usize::MAX;
    }

    /// Prior turns to send along with the next question, oldest first
    pub fn history(&self) -> Vec<ChatTurn> {
        let turns: Vec<ChatTurn> = self
            .messages
            .iter()
            .filter(|m| m.is_replayable())
            .map(|m| ChatTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let skip = turns.len().saturating_sub(self.history_limit);
        turns.into_iter().skip(skip).collect()
    }

    /// Move the typed question into the transcript and start a new exchange
    pub fn begin_exchange(&mut self) -> Option<Exchange> {
        let question = self.input_buffer.trim().to_string();
        if question.is_empty() || self.is_loading {
            return None;
        }

        let request = ChatRequest {
            question: question.clone(),
            history: self.history(),
        };

        self.messages.push(Message::new(Role::User, question));
        self.messages.push(Message::assistant_placeholder());
        self.input_buffer.clear();
        self.is_loading = true;
        self.scroll_to_bottom();

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        self.exchange += 1;
        Some(Exchange {
            id: self.exchange,
            request,
            cancel,
        })
    }

    /// Stop the running exchange; its remaining events are ignored
    pub fn abort_generation(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if !self.is_loading {
            return;
        }
        self.is_loading = false;

        if let Some(last) = self.pending_reply() {
            if last.content.is_empty() && last.error.is_none() {
                last.error = Some("Cancelled".to_string());
            }
        }
    }

    pub fn new_conversation(&mut self) {
        self.abort_generation();
        self.messages.clear();
        self.last_done = None;
        self.scroll_to_top();
    }

    /// Apply an event from the channel; events from earlier exchanges are dropped
    pub fn receive(&mut self, tagged: ExchangeEvent) {
        if tagged.exchange != self.exchange {
            tracing::debug!(
                exchange = tagged.exchange,
                current = self.exchange,
                "dropping event from a finished exchange"
            );
            return;
        }
        self.apply_event(tagged.event);
    }

    /// Apply an event to the running exchange
    pub fn apply_event(&mut self, event: AppEvent) {
        // Late events from an aborted exchange
        if !self.is_loading {
            return;
        }

        match event {
            AppEvent::Sources(sources) => {
                if let Some(reply) = self.pending_reply() {
                    reply.sources = sources;
                }
            }
            AppEvent::Thinking(token) => {
                if let Some(reply) = self.pending_reply() {
                    reply.thinking.push_str(&token);
                }
            }
            AppEvent::Answer(token) => {
                if let Some(reply) = self.pending_reply() {
                    reply.content.push_str(&token);
                }
            }
            AppEvent::Done(metadata) => {
                self.finish_exchange();
                self.last_done = Some(metadata);
            }
            AppEvent::Error(detail) => {
                if let Some(reply) = self.pending_reply() {
                    reply.error = Some(detail);
                }
                self.finish_exchange();
            }
        }

        self.scroll_to_bottom();
    }

    /// Which part of the reply is currently streaming
    pub fn phase(&self) -> Option<&'static str> {
        if !self.is_loading {
            return None;
        }
        let reply = self.messages.last()?;
        Some(if !reply.content.is_empty() {
            "Answering..."
        } else if !reply.thinking.is_empty() {
            "Thinking..."
        } else if !reply.sources.is_empty() {
            "Reading sources..."
        } else {
            "Waiting..."
        })
    }

    fn finish_exchange(&mut self) {
        self.is_loading = false;
        self.cancel = None;
    }

    fn pending_reply(&mut self) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }
}
