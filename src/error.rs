use thiserror::Error;

#[derive(Error, Debug)]
pub enum CostError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
    #[error("Inactive channel: {0}")]
    InactiveChannel(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CostError>;
