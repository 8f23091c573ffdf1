//! Error taxonomy for the engine
//!
//! Three failure families matter to callers: caller mistakes
//! (`InvalidArgument`), contended services (`Busy`), and cooperative
//! cancellation (`Cancelled`). Collaborator failures from an occurrence
//! source pass through as `Source`. Per-word division hazards during a
//! build are not errors at all; they are recovered, counted, and logged.

use thiserror::Error;

/// Errors that can occur while building or serving tag scorers
#[derive(Error, Debug)]
pub enum TaglexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Service '{service}' already has a build in flight")]
    Busy { service: String },

    #[error("Build cancelled")]
    Cancelled,

    #[error(transparent)]
    Source(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type TaglexResult<T> = Result<T, TaglexError>;

impl TaglexError {
    /// True for failures worth retrying later (contention, not breakage).
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaglexError::Busy { .. })
    }
}
