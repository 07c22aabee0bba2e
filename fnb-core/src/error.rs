/// Error types for the FNB libraries
use thiserror::Error;

/// Main error type for loading sources and resolving weather
#[derive(Error, Debug)]
pub enum FnbError {
    /// HTTP request to the weather provider failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// Weather provider answered with a non-success status
    #[error("Weather provider returned status {0}")]
    ProviderStatus(u16),

    /// Failed to parse the provider response
    #[error("Failed to parse provider response: {0}")]
    ResponseParse(String),

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to read a source file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent after header normalization
    #[error("{table}: required column {column:?} not found")]
    Schema { table: String, column: String },

    /// A required value is absent for the requested date
    #[error("Missing data: {0}")]
    MissingData(String),
}

impl FnbError {
    /// Shorthand for a schema error on a named source.
    pub fn schema(table: impl Into<String>, column: impl Into<String>) -> Self {
        FnbError::Schema {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Whether the error invalidates a whole run (as opposed to a single
    /// date or key).
    pub fn is_fatal(&self) -> bool {
        matches!(self, FnbError::Schema { .. })
    }
}

/// Type alias for Results using FnbError
pub type Result<T> = std::result::Result<T, FnbError>;
