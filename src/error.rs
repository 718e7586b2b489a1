//! Error types for vidmeta.

use thiserror::Error;

/// Library-level error type for vidmeta operations.
#[derive(Error, Debug)]
pub enum VidmetaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Context key '{key}' required by agent '{agent}' has not been produced")]
    MissingContextKey { agent: String, key: String },

    #[error("Model request failed: {message}")]
    Model {
        /// HTTP status reported by the provider, when known.
        status: Option<u16>,
        message: String,
    },

    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    #[error("Pipeline wiring is invalid:\n  - {}", .0.join("\n  - "))]
    Wiring(Vec<String>),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Agent '{0}' timed out after {1} seconds")]
    Timeout(String, u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl VidmetaError {
    /// Build a model error without a known HTTP status.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to a model error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Model { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for vidmeta operations.
pub type Result<T> = std::result::Result<T, VidmetaError>;
