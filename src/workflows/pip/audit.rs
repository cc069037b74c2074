//! Append-only audit trail for PIP issuance and termination decisions.
//!
//! Each record is written as one JSON object per line. The file-backed sink opens
//! its log in append mode for every write and performs no cross-process locking.
//! Logs can be read back as an [`AuditHistory`] to rebuild PIP cases between runs.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::domain::{Pip, Termination};

pub const PIP_LOG_FILE: &str = "pip_log.jsonl";
pub const TERMINATION_LOG_FILE: &str = "termination_log.jsonl";

/// Audit event produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuditRecord {
    PipIssued(Pip),
    Terminated(Termination),
}

impl AuditRecord {
    /// Single-line JSON rendering used by line-oriented sinks.
    pub fn to_json_line(&self) -> Result<String, AuditError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Outbound hook receiving audit records. Implementations must only ever append.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<S> {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).append(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to access audit log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("malformed record in audit log {path} at line {line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Writes PIP and termination records to separate JSONL files in one directory.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    pip_log: PathBuf,
    termination_log: PathBuf,
}

impl JsonlAuditSink {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(PIP_LOG_FILE), dir.join(TERMINATION_LOG_FILE))
    }

    pub fn new(pip_log: impl Into<PathBuf>, termination_log: impl Into<PathBuf>) -> Self {
        Self {
            pip_log: pip_log.into(),
            termination_log: termination_log.into(),
        }
    }

    pub fn pip_log(&self) -> &Path {
        &self.pip_log
    }

    pub fn termination_log(&self) -> &Path {
        &self.termination_log
    }

    /// Every record written so far. A log that does not exist yet reads as empty.
    pub fn history(&self) -> Result<AuditHistory, AuditError> {
        Ok(AuditHistory {
            pips: read_jsonl(&self.pip_log)?,
            terminations: read_jsonl(&self.termination_log)?,
        })
    }

    fn path_for(&self, record: &AuditRecord) -> &Path {
        match record {
            AuditRecord::PipIssued(_) => &self.pip_log,
            AuditRecord::Terminated(_) => &self.termination_log,
        }
    }
}

impl AuditSink for JsonlAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let path = self.path_for(record);
        let line = record.to_json_line()?;
        let io_error = |source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_error)?;
        file.write_all(line.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)
    }
}

/// PIP and termination records read back from the audit trail, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditHistory {
    pub pips: Vec<Pip>,
    pub terminations: Vec<Termination>,
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AuditError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| AuditError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// In-process sink that keeps every record, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn pips(&self) -> Vec<Pip> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                AuditRecord::PipIssued(pip) => Some(pip),
                AuditRecord::Terminated(_) => None,
            })
            .collect()
    }

    pub fn terminations(&self) -> Vec<Termination> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                AuditRecord::Terminated(termination) => Some(termination),
                AuditRecord::PipIssued(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
