use thiserror::Error;

/// Failures surfaced by an [`Exchange`](crate::api::Exchange) call
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by exchange")]
    RateLimited,

    #[error("exchange returned {status} ({name}): {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("authentication error: {0}")]
    Auth(String),
}

impl ExchangeError {
    /// Whether retrying the same request later can reasonably succeed
    ///
    /// Timeouts, connection problems, rate limiting and 5xx responses are
    /// transient. Bad credentials, rejected orders and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Timeout | ExchangeError::Transport(_) | ExchangeError::RateLimited => {
                true
            }
            ExchangeError::Api { status, .. } => *status >= 500,
            ExchangeError::Decode(_) | ExchangeError::Auth(_) => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_transient() {
            "transient"
        } else {
            "permanent"
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout
        } else if err.is_decode() {
            ExchangeError::Decode(err.to_string())
        } else {
            ExchangeError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::Decode(err.to_string())
    }
}

/// Lifecycle errors of the polling loop
#[derive(Debug, Error, PartialEq)]
pub enum BotError {
    #[error("bot is already running")]
    AlreadyRunning,
}
