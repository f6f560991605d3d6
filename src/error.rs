// src/error.rs

use thiserror::Error;

/// Failures of the extraction-and-merge core.
///
/// Malformed individual rows are not errors: the normalizer drops them and
/// counts them in its report. Everything here aborts the run before anything
/// is persisted.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("no candidate table found in the source document")]
    NoTableFound,

    /// A date cell that is not `DD.MM.YYYY`. `row` is the 0-based body row.
    #[error("row {row}: cannot parse date {value:?}, expected DD.MM.YYYY")]
    DateParse { row: usize, value: String },

    #[error("normalization produced no usable daily records ({dropped} rows dropped)")]
    NoValidRows { dropped: usize },

    #[error("unsupported document shape: {0}")]
    InvalidDocument(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}
