use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::{info, warn};
use polars::prelude::DataFrame;
use serde::Serialize;

use crate::encoding::EncodingPlan;
use crate::error::Result;
use crate::load::{self, InputSource};
use crate::prepare::{self, PipelineOptions, Prepared};
use crate::scaler::Standardizer;

/// Both tables a view may read, derived once from a single input and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct Session {
    raw: DataFrame,
    prepared: Prepared,
    options: PipelineOptions,
}

impl Session {
    pub fn from_source(source: &InputSource, options: &PipelineOptions) -> Result<Self> {
        let raw = load::load(source)?;
        Self::from_frame(raw, options)
    }

    /// Build a session from an already loaded raw table.
    pub fn from_frame(raw: DataFrame, options: &PipelineOptions) -> Result<Self> {
        let raw = prepare::impute(&raw)?;
        let prepared = prepare::run_pipeline(&raw, options)?;
        Ok(Self {
            raw,
            prepared,
            options: *options,
        })
    }

    /// Build a session, asking on `prompt` for a different file while the
    /// input itself is at fault. An empty answer or end of input gives up
    /// with the last error.
    pub fn open_with_prompt<R, W>(
        mut source: InputSource,
        options: &PipelineOptions,
        answers: &mut R,
        prompt: &mut W,
    ) -> Result<Self>
    where
        R: BufRead,
        W: Write,
    {
        loop {
            match Self::from_source(&source, options) {
                Err(e) if e.is_input_fault() => {
                    warn!("{e}");
                    write!(prompt, "Path to a replacement CSV (empty to quit): ")?;
                    prompt.flush()?;

                    let mut line = String::new();
                    answers.read_line(&mut line)?;
                    let line = line.trim();
                    if line.is_empty() {
                        return Err(e);
                    }
                    source = source.with_replacement(line);
                }
                result => return result,
            }
        }
    }

    /// Rebuild everything from an uploaded file. Nothing from the current
    /// session, scaler statistics included, carries over.
    pub fn replace<P: Into<PathBuf>>(&self, upload: P) -> Result<Self> {
        let source = InputSource::default().with_replacement(upload);
        info!("Replacing session data");
        Self::from_source(&source, &self.options)
    }

    /// Imputed table with the original categorical values.
    pub fn raw(&self) -> &DataFrame {
        &self.raw
    }

    /// Encoded, outlier-filtered and standardized table.
    pub fn cleaned(&self) -> &DataFrame {
        &self.prepared.cleaned
    }

    pub fn plan(&self) -> &EncodingPlan {
        &self.prepared.plan
    }

    pub fn scaler(&self) -> &Standardizer {
        &self.prepared.scaler
    }

    /// For each cleaned row, its row number in `raw()`.
    pub fn raw_positions(&self) -> &[usize] {
        &self.prepared.raw_positions
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            raw_rows: self.raw.height(),
            cleaned_rows: self.cleaned().height(),
            cleaned_columns: self
                .cleaned()
                .get_column_names()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            indicator_columns: self.plan().width(),
            iqr_factor: self.options.iqr_factor,
            ddof: self.options.ddof,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub raw_rows: usize,
    pub cleaned_rows: usize,
    pub cleaned_columns: Vec<String>,
    pub indicator_columns: usize,
    pub iqr_factor: f64,
    pub ddof: u8,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "raw rows:       {}", self.raw_rows)?;
        writeln!(
            f,
            "cleaned rows:   {} ({} removed as outliers)",
            self.cleaned_rows,
            self.raw_rows - self.cleaned_rows
        )?;
        writeln!(f, "indicators:     {}", self.indicator_columns)?;
        writeln!(f, "iqr factor:     {}", self.iqr_factor)?;
        writeln!(f, "std ddof:       {}", self.ddof)?;
        write!(f, "columns:        {}", self.cleaned_columns.join(", "))
    }
}
