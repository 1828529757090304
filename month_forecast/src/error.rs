//! Error types for the month_forecast crate

use thiserror::Error;

/// Custom error types for the month_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No month with a usable value was found when a run started
    #[error("Insufficient history to compute lags")]
    InsufficientHistory,

    /// The remote service answered with a non-success status
    #[error("{body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the service
        body: String,
    },

    /// Transport-level failure talking to a remote service
    #[error("HTTP error: {0}")]
    Http(String),

    /// Malformed date string
    #[error("Date error: {0}")]
    DateError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::Http(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
