use thiserror::Error;

use atelier_core::DomainError;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backing store failed; the in-memory switch was left untouched.
    #[error("maintenance store error: {0}")]
    Store(String),
}

impl MaintenanceError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
