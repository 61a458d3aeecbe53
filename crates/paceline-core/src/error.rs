//! Paceline error type.

use thiserror::Error;

/// All errors surfaced by Paceline crates.
#[derive(Debug, Error)]
pub enum PacelineError {
    /// Database open/query/migration failures.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration load/parse failures.
    #[error("config error: {0}")]
    Config(String),

    /// A referenced sender does not exist.
    #[error("sender {0} not found")]
    SenderNotFound(i64),

    /// A referenced campaign does not exist.
    #[error("campaign {0} not found")]
    CampaignNotFound(i64),

    /// A referenced target list does not exist.
    #[error("target list {0} not found")]
    ListNotFound(i64),

    /// A lifecycle transition that the state machine does not allow.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Malformed input (unknown action kind, bad status string, ...).
    #[error("invalid value: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PacelineError>;
