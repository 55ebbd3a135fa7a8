use thiserror::Error;

/// Failure taxonomy shared by every service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input; reported before anything is persisted.
    #[error("{0}")]
    Validation(String),

    /// Missing or wrong bearer token / credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// An id or position that does not resolve.
    #[error("{0} not found")]
    NotFound(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
