use thiserror::Error;

/// Top-level server lifecycle errors (startup/shutdown). Request-level
/// failures use [`crate::utils::AppError`].
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
