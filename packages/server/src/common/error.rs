use thiserror::Error;

/// Errors surfaced by the job tracker.
///
/// `NotFound` covers both a nonexistent job and a job owned by a different
/// organization; callers cannot tell the two apart.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl JobError {
    /// Whether a caller should retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Storage(_))
    }
}
