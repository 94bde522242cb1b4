//! Error types for confide.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Expected negative outcomes (a missing row, a duplicate report, a replayed
/// moderation decision) are separate variants from faults (store or transport
/// trouble) so callers can pattern-match instead of catch-all.
#[derive(Debug, Error)]
pub enum AppError {
    // === Expected outcomes ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Submission already decided: {0}")]
    AlreadyDecided(i64),

    #[error("User is banned")]
    Banned,

    #[error("Bad request: {0}")]
    BadRequest(String),

    // === Faults ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code used in logs and moderator-facing notices.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::Duplicate(_) => "DUPLICATE",
            Self::AlreadyDecided(_) => "ALREADY_DECIDED",
            Self::Banned => "BANNED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is a fault rather than an expected outcome.
    ///
    /// Faults bubble to the per-event top-level handler and are logged at
    /// error level; expected outcomes are converted to user-facing replies at
    /// the component boundary.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Transport(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

// === From implementations ===

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
