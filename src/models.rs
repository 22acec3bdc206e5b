use serde::{Deserialize, Serialize};

/// Who authored a turn of the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// One prior turn sent back to the backend as history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Body of the chat-stream POST
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub question: String,
    pub history: Vec<ChatTurn>,
}

/// A retrieved document the answer is grounded on.
///
/// The backend decides which descriptor fields it fills in; anything we do
/// not model is kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Source {
    /// Short human label, falling back through the known descriptor fields
    pub fn display_name(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        self.extra
            .get("source")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| "untitled source".to_string(), ToString::to_string)
    }
}

/// Completion metadata carried by a `done` record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_used: Option<u64>,
}

/// A rendered transcript entry
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub thinking: String,
    pub sources: Vec<Source>,
    pub error: Option<String>,
}

impl Message {
    pub const fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            thinking: String::new(),
            sources: Vec::new(),
            error: None,
        }
    }

    pub const fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    /// Whether this entry should be replayed to the backend as history
    pub fn is_replayable(&self) -> bool {
        self.error.is_none() && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    #[serde(default = "default_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub complete_on_cancel: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_stream_path() -> String {
    "/api/chat/stream".to_string()
}

const fn default_timeout() -> u64 {
    600
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_history_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            stream_path: default_stream_path(),
            request_timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            history_limit: default_history_limit(),
            complete_on_cancel: false,
            log_level: default_log_level(),
            theme: ThemeConfig::default(),
        }
    }
}

#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub user_message_color: String,
    pub assistant_message_color: String,
    pub thinking_color: String,
    pub border_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            user_message_color: "cyan".to_string(),
            assistant_message_color: "green".to_string(),
            thinking_color: "darkgray".to_string(),
            border_color: "cyan".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            question: "How tall may it be?".to_string(),
            history: vec![
                ChatTurn {
                    role: Role::User,
                    content: "Hi".to_string(),
                },
                ChatTurn {
                    role: Role::Assistant,
                    content: "Hello".to_string(),
                },
            ],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "question": "How tall may it be?",
                "history": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"}
                ]
            })
        );
    }

    #[test]
    fn test_source_keeps_unknown_fields() {
        let json = r#"{"title":"Zoning plan","page":4,"source":"plan.pdf"}"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert_eq!(source.title.as_deref(), Some("Zoning plan"));
        assert_eq!(source.extra.get("page"), Some(&serde_json::json!(4)));
        assert_eq!(source.display_name(), "Zoning plan");
    }

    #[test]
    fn test_source_display_name_fallbacks() {
        let by_file: Source = serde_json::from_str(r#"{"source":"plan.pdf"}"#).unwrap();
        assert_eq!(by_file.display_name(), "plan.pdf");

        let by_url = Source {
            url: Some("https://example.org/doc".to_string()),
            ..Source::default()
        };
        assert_eq!(by_url.display_name(), "https://example.org/doc");

        assert_eq!(Source::default().display_name(), "untitled source");
    }

    #[test]
    fn test_done_metadata_defaults() {
        let meta: DoneMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, DoneMetadata::default());

        let meta: DoneMetadata =
            serde_json::from_str(r#"{"model":"x","context_used":3}"#).unwrap();
        assert_eq!(meta.model.as_deref(), Some("x"));
        assert_eq!(meta.context_used, Some(3));
    }

    #[test]
    fn test_message_is_replayable() {
        let mut msg = Message::assistant_placeholder();
        assert!(!msg.is_replayable());

        msg.content.push_str("An answer");
        assert!(msg.is_replayable());

        msg.error = Some("boom".to_string());
        assert!(!msg.is_replayable());
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.stream_path, "/api/chat/stream");
        assert!(!config.complete_on_cancel);
    }

    #[test]
    fn test_app_config_partial_toml() {
        let config: AppConfig = toml::from_str(r#"server_url = "http://backend:9000""#).unwrap();
        assert_eq!(config.server_url, "http://backend:9000");
        assert_eq!(config.request_timeout, 600);
        assert_eq!(config.theme.border_color, "cyan");
    }
}
