use thiserror::Error;

/// Error kinds surfaced by the scheduling core. Infrastructure failures
/// (pool setup, migrations) stay `anyhow::Result`; only operations that a
/// transport layer must map to a status code return `CoreError`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing bearer credential")]
    AuthMissing,

    #[error("credential does not map to a known worker")]
    AuthInvalid,

    #[error("not found")]
    NotFound,

    #[error("task is not assigned to this worker")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
