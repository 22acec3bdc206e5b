use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that end a chat stream session
#[derive(Debug, Error)]
pub enum StreamError {
    /// The backend answered with a non-2xx status before streaming began
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent or the body broke off mid-stream
    #[error("network error: {0}")]
    Transport(#[source] BoxError),

    /// The caller cancelled the exchange
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = StreamError::Http {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: overloaded");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = StreamError::Transport(Box::new(io));
        assert_eq!(err.to_string(), "network error: reset by peer");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancelled() {
        assert!(StreamError::Cancelled.is_cancelled());
    }
}
