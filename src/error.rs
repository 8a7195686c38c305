use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrepareError>;

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("no input file found at {path:?}")]
    MissingInput { path: PathBuf },
    #[error("input is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("column {column:?} has zero standard deviation and cannot be standardized")]
    DegenerateColumn { column: String },
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrepareError {
    /// True when the input file itself is at fault and a different file could fix it.
    pub fn is_input_fault(&self) -> bool {
        matches!(self, Self::MissingInput { .. } | Self::Schema { .. })
    }
}
