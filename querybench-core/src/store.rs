//! Result Store
//!
//! Append-only collection of every `RunRecord` of a session. Optionally
//! mirrors each appended record as one JSON line to a results file, so an
//! interrupted session leaves a file that can be re-aggregated later.
//!
//! Readers only ever see a frozen snapshot (`&[RunRecord]`); records are
//! never mutated or removed once appended.

use crate::model::RunRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors persisting or loading run records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Results file I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record at {path}:{line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Append-only, single-writer collection of run records
#[derive(Default)]
pub struct ResultStore {
    records: Vec<RunRecord>,
    sink: Option<JsonLinesSink>,
}

impl ResultStore {
    /// In-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that also appends every record to `path` as JSON lines
    pub fn with_results_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            records: Vec::new(),
            sink: Some(JsonLinesSink {
                path,
                writer: BufWriter::new(file),
            }),
        })
    }

    /// Load the records of a results file written by a previous session
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
            records.push(record);
        }

        Ok(Self {
            records,
            sink: None,
        })
    }

    /// Append a record. The in-memory copy is kept even if persisting fails.
    pub fn append(&mut self, record: RunRecord) -> Result<(), StoreError> {
        let persisted = match self.sink.as_mut() {
            Some(sink) => write_line(sink, &record),
            None => Ok(()),
        };
        self.records.push(record);
        persisted
    }

    /// Frozen view of everything appended so far
    pub fn snapshot(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been appended
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn write_line(sink: &mut JsonLinesSink, record: &RunRecord) -> Result<(), StoreError> {
    let line = serde_json::to_string(record)?;
    let io_err = |source| StoreError::Io {
        path: sink.path.clone(),
        source,
    };
    sink.writer.write_all(line.as_bytes()).map_err(io_err)?;
    sink.writer.write_all(b"\n").map_err(io_err)?;
    sink.writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Direction, IterationContext, PartialMetrics, RoundPlan, RunSlot};

    fn record(sql: &str, exec_ms: Option<f64>) -> RunRecord {
        let ctx = IterationContext::new(0, 1, 1);
        let plan = RoundPlan {
            iteration: 0,
            round: 1,
            offset: 0,
            direction: Direction::Forward,
            order: vec![sql.to_string()],
        };
        let slot = RunSlot {
            context: &ctx,
            plan: &plan,
            position: 1,
            sql,
            case_id: "c1",
            category: "lpc/lsc",
        };
        match exec_ms {
            Some(ms) => RunRecord::completed(
                slot,
                PartialMetrics {
                    exec_ms: Some(ms),
                    ..PartialMetrics::absent()
                },
                format!("Execution Time: {} ms", ms),
            ),
            None => RunRecord::timed_out(slot),
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = ResultStore::new();
        store.append(record("a", Some(1.0))).unwrap();
        store.append(record("b", None)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].sql, "a");
        assert!(snapshot[1].timed_out);
    }

    #[test]
    fn test_results_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut store = ResultStore::with_results_file(&path).unwrap();
        store.append(record("a", Some(12.5))).unwrap();
        store.append(record("b", None)).unwrap();
        drop(store);

        let loaded = ResultStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.snapshot()[0].exec_ms, Some(12.5));
        assert!(loaded.snapshot()[1].timed_out);
    }

    #[test]
    fn test_load_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        std::fs::write(&path, "{\"nope\": 1}\n").unwrap();

        let err = ResultStore::load(&path).err().unwrap();
        assert!(matches!(err, StoreError::Decode { line: 1, .. }));
    }
}
