//! Error types for search session operations.

use std::path::PathBuf;

use search_session_protocol::ErrorInfo;

/// All errors that can occur while tracking, saving or cancelling a session.
///
/// Precondition failures are raised before any collaborator is called.
/// Collaborator failures are passed through untouched; nothing here retries.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    // ─────────────────────────────────────────────────────────────────────
    // Precondition Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No active search session to save")]
    NoActiveSession,

    #[error("No current application id; the navigation watcher has not reported one yet")]
    NoCurrentApp,

    #[error("No search session info provider registered for the active session")]
    NoInfoProvider,

    #[error("Session service has been destroyed")]
    Destroyed,

    // ─────────────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session info provider failed: {details}")]
    Provider { details: String },

    #[error("Search session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid search session: {0}")]
    InvalidSession(ErrorInfo),

    #[error("Session store at {path} is unreadable: {details}")]
    StoreCorrupt { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Failure raised by a [`SearchSessionInfoProvider`] implementation.
    ///
    /// [`SearchSessionInfoProvider`]: crate::provider::SearchSessionInfoProvider
    pub fn provider(details: impl Into<String>) -> Self {
        SessionError::Provider {
            details: details.into(),
        }
    }

    /// True for the failures `save` raises before doing any asynchronous work.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SessionError::NoActiveSession | SessionError::NoCurrentApp | SessionError::NoInfoProvider
        )
    }
}

/// Convenience type alias for Results using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<ErrorInfo> for SessionError {
    fn from(info: ErrorInfo) -> Self {
        SessionError::InvalidSession(info)
    }
}
