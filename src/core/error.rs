use crate::core::instrument::InstrumentId;
use thiserror::Error;

/// Failures reported by a [`Repository`](crate::engine::repository::Repository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no recorded history for instrument {0}")]
    NotFound(InstrumentId),
    #[error("repository backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by a VaR calculation.
///
/// Every variant is reported to the immediate caller; nothing inside the
/// engine retries.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("no price data for instrument {0}")]
    NoData(InstrumentId),
    #[error("insufficient samples: {available} return observations, at least {required} required")]
    InsufficientSamples { available: usize, required: usize },
    #[error("simulation failed: {0}")]
    SimulationFailure(String),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl VarError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        VarError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<RepositoryError> for VarError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => VarError::NoData(id),
            other => VarError::Repository(other),
        }
    }
}
