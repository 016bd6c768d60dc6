//! Error types for the sill frame SDK.

use thiserror::Error;

/// Result type alias using our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sill frame SDK.
#[derive(Error, Debug)]
pub enum Error {
    /// Channel transport errors (broken pipe, closed writer)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Startup handshake errors
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// Protocol errors (malformed or unexpected envelopes)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Errors reported by the host for a call we issued
    #[error("Host error: {code}: {message}")]
    Host { code: String, message: String },

    /// Author hook errors
    #[error("Hook error: {hook}: {message}")]
    Hook { hook: String, message: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] Box<std::io::Error>),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] Box<serde_json::Error>),
}

impl Error {
    /// Create a channel error.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel(message.into())
    }

    /// Create a handshake error.
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a host error from a failed response envelope.
    pub fn host(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Host {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a hook error.
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wire error code used when reporting this error back to the host.
    #[must_use]
    pub fn wire_code(&self) -> &'static str {
        match self {
            Self::Channel(_) => "channel",
            Self::Handshake(_) => "handshake",
            Self::Protocol(_) => "protocol",
            Self::Host { .. } => "host",
            Self::Hook { .. } => "hook_error",
            Self::Validation(_) => "invalid_request",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Box::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(Box::new(value))
    }
}
