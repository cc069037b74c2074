//! CSV ingestion for score series.
//!
//! Expected headers are `employee_id,score,date` (`timestamp` is accepted in place
//! of `date`). Rows are recorded in file order, so equal timestamps for the same
//! employee keep the order they appear in the export.

mod parser;

pub use parser::parse_timestamp;

use crate::workflows::pip::ScoreSeries;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ScoreImportError {
    #[error("failed to read score export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid score CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unrecognised timestamp '{value}'")]
    Timestamp { line: usize, value: String },
    #[error("line {line}: employee_id is empty")]
    MissingEmployee { line: usize },
}

pub struct ScoreSeriesImporter;

impl ScoreSeriesImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ScoreSeries, ScoreImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ScoreSeries, ScoreImportError> {
        Ok(parser::parse_observations(reader)?.into_iter().collect())
    }
}
