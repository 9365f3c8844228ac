//! Error types for chatctl.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("could not resolve `{0}` into a user or team")]
    Resolution(String),

    #[error("{count} conversations match `{name}`; narrow the request or run interactively")]
    AmbiguousConversation { name: String, count: usize },

    #[error("Conversation already exists: {0}")]
    AlreadyExists(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Conversation {id} unavailable: {reason}")]
    ConversationUnavailable { id: String, reason: String },

    #[error("Duplicate conversation id: {0}")]
    DuplicateConversationId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl Error {
    /// True when the name did not map to any known user or team.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Error::Resolution(_))
    }

    pub fn transport(s: impl Into<String>) -> Self {
        Error::Transport(s.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Error::Transport(format!("request timed out: {}", err));
        }
        Error::Transport(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message() {
        let err = Error::Resolution("alice,nobody".to_string());
        assert_eq!(
            err.to_string(),
            "could not resolve `alice,nobody` into a user or team"
        );
        assert!(err.is_resolution());
        assert!(!Error::transport("down").is_resolution());
    }

    #[test]
    fn test_ambiguous_message() {
        let err = Error::AmbiguousConversation {
            name: "acme".to_string(),
            count: 3,
        };
        let display = err.to_string();
        assert!(display.contains("3 conversations"));
        assert!(display.contains("acme"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
