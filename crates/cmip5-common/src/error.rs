//! Error types for the NEX-GDDP export crates.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using Cmip5Error.
pub type Cmip5Result<T> = Result<T, Cmip5Error>;

/// Primary error type for scenario configuration and remote export.
#[derive(Debug, Error)]
pub enum Cmip5Error {
    // === Configuration Errors ===
    #[error("{0} is not a supported variable (expected pr, tasmin or tasmax)")]
    UnsupportedVariable(String),

    #[error("{0} is not a supported download mode (expected URL or drive)")]
    UnsupportedExportMode(String),

    #[error("{0} is not a supported scenario (expected historical, rcp45 or rcp85)")]
    UnsupportedScenario(String),

    #[error("Invalid date range: start {start} must precede end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Data Errors ===
    #[error("No daily images between {start} and {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    // === Remote Service Errors ===
    #[error("Remote service connection failed: {0}")]
    Connection(String),

    #[error("Remote service error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Failed to decode remote response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for Cmip5Error {
    fn from(err: serde_json::Error) -> Self {
        Cmip5Error::Decode(format!("JSON error: {}", err))
    }
}
