//! The dataset preparer: impute, encode, filter outliers, standardize.

use log::{debug, info, warn};
use polars::prelude::*;

use crate::encoding::EncodingPlan;
use crate::error::{PrepareError, Result};
use crate::records::{AVG_GLUCOSE_LEVEL, BMI, CATEGORICAL_COLUMNS, CONTINUOUS_COLUMNS, OUTLIER_ORDER};
use crate::scaler::Standardizer;

pub const DEFAULT_IQR_FACTOR: f64 = 1.5;

/// Hidden column tying cleaned rows back to raw rows while filtering.
const ROW_INDEX: &str = "__row";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub iqr_factor: f64,
    pub ddof: u8,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            iqr_factor: DEFAULT_IQR_FACTOR,
            ddof: 0,
        }
    }
}

/// Output of the pipeline after imputation.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub cleaned: DataFrame,
    pub plan: EncodingPlan,
    pub scaler: Standardizer,
    /// Position in the raw table of each cleaned row.
    pub raw_positions: Vec<usize>,
}

/// First and third quartile of a column, linearly interpolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
}

impl Quartiles {
    /// `None` when the column has no non-missing values.
    pub fn of(values: &Float64Chunked) -> Result<Option<Self>> {
        let q1 = values.quantile(0.25, QuantileInterpolOptions::Linear)?;
        let q3 = values.quantile(0.75, QuantileInterpolOptions::Linear)?;
        Ok(q1.zip(q3).map(|(q1, q3)| Self { q1, q3 }))
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Inclusive `(lower, upper)` fences `factor` IQRs outside the quartiles.
    pub fn bounds(&self, factor: f64) -> (f64, f64) {
        let reach = factor * self.iqr();
        (self.q1 - reach, self.q3 + reach)
    }
}

/// Fill missing `bmi` with its median and missing `avg_glucose_level` with
/// its mean. No other column is touched.
pub fn impute(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();
    for (column, statistic) in [(BMI, median as Statistic), (AVG_GLUCOSE_LEVEL, mean as Statistic)] {
        let series = float_column(df, column)?;
        let values = series.f64()?;
        if values.null_count() == 0 {
            continue;
        }

        match statistic(values) {
            Some(fill) => {
                debug!("Filling {} missing {} value(s) with {}", values.null_count(), column, fill);
                let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
                result.with_column(Series::new(column, filled))?;
            }
            None => warn!("Column {column} has no values to impute from; leaving it missing"),
        }
    }
    Ok(result)
}

type Statistic = fn(&Float64Chunked) -> Option<f64>;

fn median(values: &Float64Chunked) -> Option<f64> {
    values.median()
}

fn mean(values: &Float64Chunked) -> Option<f64> {
    values.mean()
}

/// One-hot encode the categorical fields, dropping one reference category
/// per field.
pub fn encode(df: &DataFrame) -> Result<(DataFrame, EncodingPlan)> {
    let plan = EncodingPlan::discover(df, &CATEGORICAL_COLUMNS)?;
    let encoded = plan.apply(df)?;
    Ok((encoded, plan))
}

/// Keep only rows whose `column` lies within the inclusive IQR fences of
/// that column. Missing values never fall inside the fences.
pub fn remove_outliers(df: &DataFrame, column: &str, factor: f64) -> Result<DataFrame> {
    let series = float_column(df, column)?;
    let Some(quartiles) = Quartiles::of(series.f64()?)? else {
        warn!("Column {column} has no values; dropping all {} row(s)", df.height());
        return Ok(df.slice(0, 0));
    };

    let (lower, upper) = quartiles.bounds(factor);
    let kept = df
        .clone()
        .lazy()
        .filter(col(column).gt_eq(lit(lower)).and(col(column).lt_eq(lit(upper))))
        .collect()?;

    debug!(
        "Outliers on {column}: bounds [{lower}, {upper}], kept {} of {} row(s)",
        kept.height(),
        df.height()
    );
    Ok(kept)
}

/// Z-score `columns` with statistics of `df` itself.
pub fn standardize(df: &DataFrame, columns: &[&str], ddof: u8) -> Result<(DataFrame, Standardizer)> {
    let mut scaler = Standardizer::new(ddof);
    let scaled = scaler.fit_transform(df, columns)?;
    Ok((scaled, scaler))
}

/// Encode, filter outliers on bmi then glucose then age, and standardize the
/// continuous columns. `raw` must already be imputed.
pub fn run_pipeline(raw: &DataFrame, options: &PipelineOptions) -> Result<Prepared> {
    let (mut encoded, plan) = encode(raw)?;
    let positions: Vec<u32> = (0..raw.height() as u32).collect();
    encoded.with_column(Series::new(ROW_INDEX, positions))?;

    let mut filtered = encoded;
    for column in OUTLIER_ORDER {
        filtered = remove_outliers(&filtered, column, options.iqr_factor)?;
    }

    let (scaled, scaler) = standardize(&filtered, &CONTINUOUS_COLUMNS, options.ddof)?;
    let raw_positions = scaled
        .column(ROW_INDEX)?
        .u32()?
        .into_no_null_iter()
        .map(|p| p as usize)
        .collect();
    let cleaned = scaled.drop(ROW_INDEX)?;

    info!(
        "Prepared {} of {} row(s) with {} indicator column(s)",
        cleaned.height(),
        raw.height(),
        plan.width()
    );
    Ok(Prepared {
        cleaned,
        plan,
        scaler,
        raw_positions,
    })
}

/// `column` as a float series, or `ColumnNotFound`.
pub(crate) fn float_column(df: &DataFrame, column: &str) -> Result<Series> {
    let series = df
        .column(column)
        .map_err(|_| PrepareError::ColumnNotFound(column.to_string()))?;
    Ok(series.cast(&DataType::Float64)?)
}
