use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Normalized failure shape handed to callers: `{message, statusCode}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (HTTP {})", self.message, self.status_code)
    }
}

/// Failures of the sign-in and refresh exchanges.
///
/// `Clone` so a single refresh failure can be handed to every request that
/// was queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Refresh token rejected: {0}")]
    InvalidRefreshToken(String),

    #[error("No refresh token available. Run: partnerdash signin")]
    NoRefreshToken,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Token refresh was abandoned before it completed")]
    RefreshAbandoned,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials(_) => "invalid_credentials",
            AuthError::InvalidRefreshToken(_) => "invalid_refresh_token",
            AuthError::NoRefreshToken => "no_refresh_token",
            AuthError::AccessDenied(_) => "access_denied",
            AuthError::Network(_) => "network_error",
            AuthError::RefreshAbandoned => "refresh_abandoned",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Api(ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Timeout after {}s calling {path}", duration.as_secs())]
    Timeout { path: String, duration: Duration },

    #[error("Cannot reach API at {path}: {source}")]
    Transport {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Error in config {}: {detail}", path.display())]
    Config { path: PathBuf, detail: String },

    #[error("Not signed in. Run: partnerdash signin")]
    AuthRequired,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Api(_) => "api_error",
            ClientError::Auth(e) => e.code(),
            ClientError::Timeout { .. } => "timeout",
            ClientError::Transport { .. } => "transport_error",
            ClientError::Protocol(_) => "parse_error",
            ClientError::Config { .. } => "config_error",
            ClientError::AuthRequired => "auth_required",
            ClientError::Io(_) => "io_error",
        }
    }

    /// True for an HTTP 401 that reached the caller.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_unauthorized())
    }

    /// Collapse any failure into the `{message, statusCode}` shape.
    pub fn normalized(&self) -> ApiError {
        match self {
            ClientError::Api(e) => e.clone(),
            ClientError::Auth(_) | ClientError::AuthRequired => ApiError::new(self.to_string(), 401),
            ClientError::Timeout { .. } => ApiError::new(self.to_string(), 408),
            _ => ApiError::new(self.to_string(), 500),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let normalized = self.normalized();
        serde_json::json!({
            "error": {
                "message": normalized.message,
                "statusCode": normalized.status_code,
                "code": self.code(),
            }
        })
    }
}
