use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info};
use polars::prelude::DataFrame;

use crate::error::{PrepareError, Result};
use crate::records::StrokeRecord;

pub const DEFAULT_INPUT: &str = "pydb.csv";

/// Where the session reads its table from: a default local file, or a
/// replacement the user supplied. A replacement always wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub default: PathBuf,
    pub replacement: Option<PathBuf>,
}

impl Default for InputSource {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT)
    }
}

impl InputSource {
    pub fn new<P: Into<PathBuf>>(default: P) -> Self {
        Self {
            default: default.into(),
            replacement: None,
        }
    }

    pub fn with_replacement<P: Into<PathBuf>>(mut self, upload: P) -> Self {
        self.replacement = Some(upload.into());
        self
    }

    /// The file to read. A replacement that is not a file is reported as
    /// missing rather than falling back to the default.
    pub fn resolve(&self) -> Result<&Path> {
        let path = self.replacement.as_ref().unwrap_or(&self.default);
        if !path.is_file() {
            return Err(PrepareError::MissingInput { path: path.clone() });
        }
        Ok(path.as_path())
    }
}

/// Load the raw table from whichever file `source` resolves to.
pub fn load(source: &InputSource) -> Result<DataFrame> {
    let path = source.resolve()?;
    info!("Loading stroke data from {}", path.display());
    let file = File::open(path)?;
    read_csv(file)
}

/// Parse a delimited table with a header row. The header is checked for the
/// required columns before any row is read.
pub fn read_csv<R: Read>(input: R) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let missing = StrokeRecord::missing_columns(reader.headers()?.iter());
    if !missing.is_empty() {
        return Err(PrepareError::Schema { missing });
    }

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<StrokeRecord>, csv::Error>>()?;
    debug!("Parsed {} records", records.len());

    Ok(StrokeRecord::into_frame(&records)?)
}
