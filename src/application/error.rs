use thiserror::Error;

/// A single action or event that could not be turned into candidate records.
///
/// These never fail a block; the item is dropped and reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("decode error at {location}: {reason}")]
    Decode { location: String, reason: String },

    #[error("unexpected shape at {location}: {reason}")]
    FieldShape { location: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("block source failed: {0}")]
    Source(String),

    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("write to {table} failed: {reason}")]
    Write { table: String, reason: String },

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("invalid indexer rule: {0}")]
    Rule(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;
