use thiserror::Error;

/// Failures raised by the drills and their reference checks.
#[derive(Debug, Error)]
pub enum DrillError {
    #[error("row {row}: cannot parse date '{value}'")]
    UnparseableDate { row: usize, value: String },

    #[error("row {row}: missing value in rating column '{column}'")]
    MissingRating { column: &'static str, row: usize },

    #[error("no values to take a percentile of")]
    NoValues,

    #[error("quantile {0} is outside [0, 1]")]
    InvalidQuantile(f64),

    #[error("{drill}: expected {expected}, got {actual}")]
    Mismatch {
        drill: &'static str,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, DrillError>;
