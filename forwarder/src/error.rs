use relay::config::ConfigError;
use relay::ValidationError;
use thiserror::Error;

/// Everything a forward call can fail with.
///
/// Session expiry is normally recovered inside the destination. It only
/// escapes once the bounded re-authentication retries are used up.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("session expired after {retries} re-authentication attempt(s)")]
    SessionExpired { retries: u32 },

    #[error("{object} rejected ({status}): {code}: {message}")]
    DestinationRejected {
        object: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("malformed error response from {object} ({status}): {reason}")]
    MalformedResponse {
        object: String,
        status: u16,
        reason: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ForwardError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ForwardError::SessionExpired { .. })
    }

    /// Short machine-readable label, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Configuration(_) => "configuration",
            ForwardError::Validation(_) => "validation",
            ForwardError::Authentication(_) => "authentication",
            ForwardError::SessionExpired { .. } => "session_expired",
            ForwardError::DestinationRejected { .. } => "destination_rejected",
            ForwardError::MalformedResponse { .. } => "malformed_response",
            ForwardError::Transport(_) => "transport",
        }
    }
}
