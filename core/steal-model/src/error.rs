use thiserror::Error;

/// Errors raised by the steal-time model.
///
/// Every variant is a local, deterministic failure: nothing here is transient
/// and nothing is worth retrying.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("{remaining} task(s) still in flight after a {tail_margin_ms} ms drain window")]
    Undrained { remaining: usize, tail_margin_ms: f64 },
    #[error("task {index} has no completion time")]
    IncompleteTask { index: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SimError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Rejects anything that is not a finite, strictly positive number.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(name, value, "must be finite and > 0"))
    }
}

pub(crate) fn require_capacity(capacity: u32) -> Result<(), SimError> {
    if capacity == 0 {
        return Err(SimError::invalid("capacity", 0.0, "must be > 0"));
    }
    Ok(())
}
