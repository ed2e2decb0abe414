use thiserror::Error;

/// Startup configuration failures. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid proxy url {url:?}: {message}")]
    InvalidProxy { url: String, message: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failures of a single model call. None are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Non-2xx from the remote endpoint; body kept verbatim
    #[error("remote rejected the request (status {status}): {body}")]
    RemoteRejected { status: u16, body: String },
    /// 2xx but no text at candidates[0].content.parts[0].text
    #[error("response contained no text, possibly filtered upstream: {body}")]
    EmptyContent { body: String },
    /// Network, TLS or timeout failure
    #[error("network failure: {message}")]
    Transport { message: String },
}

impl GatewayError {
    /// Short kind name for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::RemoteRejected { .. } => "remote_rejected",
            GatewayError::EmptyContent { .. } => "empty_content",
            GatewayError::Transport { .. } => "transport",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport {
            message: err.to_string(),
        }
    }
}

/// Rejected session transitions
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("still waiting for a reply to the previous message")]
    AwaitingReply,
    #[error("there is no unanswered message to retry")]
    NothingToRetry,
    /// Reply for an exchange that was reset or already completed
    #[error("session was reset before the reply arrived")]
    Superseded,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
