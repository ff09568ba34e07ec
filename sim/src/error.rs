use steal_model::SimError;
use thiserror::Error;

use crate::logging::LoggerError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Logger(#[from] LoggerError),
    #[error("{0}")]
    Usage(String),
}
