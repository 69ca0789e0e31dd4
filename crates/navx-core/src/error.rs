use thiserror::Error;

/// Validation errors for instrument codes, dates, and request inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument code cannot be empty")]
    EmptyCode,
    #[error("instrument code '{value}' is not numeric and carries no exchange suffix")]
    CodeNotNumeric { value: String },
    #[error("instrument code '{value}' exceeds {max} digits")]
    CodeTooLong { value: String, max: usize },
    #[error("date '{value}' is not a valid 8-digit YYYYMMDD calendar date")]
    InvalidDate { value: String },
}

/// Errors raised while reshaping a raw provider payload into a [`Table`].
///
/// [`Table`]: crate::table::Table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },
}

/// Errors surfaced by the provider client. A single failed call propagates
/// immediately to the caller; the client performs no retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider rejected call '{api_name}': {message} (code {code})")]
    Api {
        api_name: String,
        code: i64,
        message: String,
    },
    #[error("transport failure calling '{api_name}': {message}")]
    Transport { api_name: String, message: String },
    #[error("malformed provider response for '{api_name}': {message}")]
    Malformed { api_name: String, message: String },
    #[error(transparent)]
    Table(#[from] TableError),
}
