// Chat-stream API client

pub mod transport;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::{AppConfig, ChatRequest};
use crate::stream::{ChatListener, Completion, Session, SessionOptions, StreamError};

#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    client: Client,
    options: SessionOptions,
}

impl ChatClient {
    pub fn new(
        base_url: &str,
        stream_path: &str,
        request_timeout: u64,
        connect_timeout: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout))
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: join_url(base_url, stream_path),
            client,
            options: SessionOptions::default(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Self::new(
            &config.server_url,
            &config.stream_path,
            config.request_timeout,
            config.connect_timeout,
        )?;
        Ok(client.with_options(SessionOptions {
            complete_on_cancel: config.complete_on_cancel,
        }))
    }

    #[must_use]
    pub const fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a question and feed the streamed reply to `listener`.
    ///
    /// Exactly one of `on_done`/`on_error` reaches the listener unless the
    /// exchange is cancelled. Transport failures are reported to the listener
    /// and returned as well.
    pub async fn stream_chat<L: ChatListener + ?Sized>(
        &self,
        request: &ChatRequest,
        listener: &mut L,
        cancel: &CancellationToken,
    ) -> Result<Completion, StreamError> {
        let session = Session::new(self.options);
        tracing::info!(
            session = %session.id(),
            endpoint = %self.endpoint,
            history = request.history.len(),
            "starting chat stream"
        );

        let opened = transport::open(self.client.post(&self.endpoint).json(request), cancel.clone()).await;
        session.run(opened, listener).await
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{}", path.trim_start_matches('/'))
}
