//! Z-score standardization.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PrepareError, Result};

/// Mean and standard deviation a column was fitted with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

/// Rescales columns to zero mean and unit variance. The statistics come
/// from `fit`; `transform` reuses them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    ddof: u8,
    stats: BTreeMap<String, ColumnStats>,
}

impl Standardizer {
    /// `ddof` is the delta degrees of freedom of the standard deviation:
    /// 0 for the population estimate, 1 for the sample estimate.
    pub fn new(ddof: u8) -> Self {
        Self {
            ddof,
            stats: BTreeMap::new(),
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.stats.clear();
        for name in columns {
            let series = df
                .column(name)
                .map_err(|_| PrepareError::ColumnNotFound(name.to_string()))?
                .cast(&DataType::Float64)?;
            let values = series.f64()?;

            let degenerate = || PrepareError::DegenerateColumn {
                column: name.to_string(),
            };
            let mean = values.mean().ok_or_else(degenerate)?;
            let std = values.std(self.ddof).ok_or_else(degenerate)?;
            if std == 0.0 || !std.is_finite() {
                return Err(degenerate());
            }

            self.stats.insert(name.to_string(), ColumnStats { mean, std });
        }
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for (name, stats) in &self.stats {
            let series = df
                .column(name)
                .map_err(|_| PrepareError::ColumnNotFound(name.clone()))?
                .cast(&DataType::Float64)?;
            let scaled: Vec<Option<f64>> = series
                .f64()?
                .into_iter()
                .map(|value| value.map(|x| (x - stats.mean) / stats.std))
                .collect();
            result.with_column(Series::new(name, scaled))?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn stats(&self, column: &str) -> Option<&ColumnStats> {
        self.stats.get(column)
    }

    pub fn ddof(&self) -> u8 {
        self.ddof
    }
}
