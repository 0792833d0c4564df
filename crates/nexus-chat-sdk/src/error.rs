//! Error types for the Nexus chat SDK.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The client lacks the elevated credential an operation requires.
    #[error("Permission denied: {action} requires a client initialized with a secret key")]
    PermissionDenied { action: String },

    /// A caller-supplied argument was rejected before any remote call.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The metadata store rejected or failed a query.
    #[error("Remote query failed: {message}")]
    RemoteQuery { message: String },

    /// The HTTP response had a non-2xx status code.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// An error from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A store record could not be normalized.
    #[error("Malformed record: {message}")]
    MalformedRecord { message: String },

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background task was requested outside a Tokio runtime.
    #[error("Runtime error: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ChatError {
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied { action: action.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteQuery { message: message.into() }
    }

    /// Whether the failure happened at the store boundary.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteQuery { .. } | Self::Api { .. } | Self::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
