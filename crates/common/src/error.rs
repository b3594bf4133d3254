use thiserror::Error;

/// Shared error type across all opine crates.
#[derive(Debug, Error)]
pub enum OpineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("integration error: {0}")]
    Integration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type OpineResult<T> = Result<T, OpineError>;
