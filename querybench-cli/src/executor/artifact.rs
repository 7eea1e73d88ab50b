//! Raw plan artifact
//!
//! Every successful run's plan text is appended to one session-wide file
//! (`explains_all.txt`) in run order. Each block is flushed on its own so an
//! interrupted session still leaves a well-formed artifact.

use querybench_core::RunRecord;
use querybench_explain::clean_plan_output;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Block header identifying one run
pub fn block_header(record: &RunRecord) -> String {
    format!(
        "== {}__{}__i{}_r{:02}_p{:02} ==",
        record.case_id, record.sql, record.iteration, record.round, record.position
    )
}

/// Append-only writer of plan text blocks
pub struct ExplainArtifact {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ExplainArtifact {
    /// Create (truncate) the artifact at `path`
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Artifact location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the cleaned plan text of a completed run
    pub fn append(&mut self, record: &RunRecord) -> std::io::Result<()> {
        writeln!(self.writer, "{}", block_header(record))?;
        writeln!(self.writer, "{}", clean_plan_output(&record.raw_text))?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querybench_core::{Direction, IterationContext, PartialMetrics, RoundPlan, RunSlot};

    fn record(raw: &str) -> RunRecord {
        let ctx = IterationContext::new(1, 100, 2);
        let plan = RoundPlan {
            iteration: 1,
            round: 2,
            offset: 1,
            direction: Direction::Reverse,
            order: vec!["v1".into(), "v2".into()],
        };
        let slot = RunSlot {
            context: &ctx,
            plan: &plan,
            position: 3,
            sql: "v1",
            case_id: "001-2p-1s-1g",
            category: "lpc/lsc",
        };
        RunRecord::completed(slot, PartialMetrics::absent(), raw.to_string())
    }

    #[test]
    fn test_header_format() {
        assert_eq!(
            block_header(&record("")),
            "== 001-2p-1s-1g__v1__i1_r02_p03 =="
        );
    }

    #[test]
    fn test_blocks_are_cleaned_and_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explains_all.txt");
        let mut artifact = ExplainArtifact::create(&path).unwrap();

        artifact
            .append(&record(" QUERY PLAN\n-----------\n Seq Scan on t\n Execution Time: 1.0 ms"))
            .unwrap();

        // Readable before the writer is dropped
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "== 001-2p-1s-1g__v1__i1_r02_p03 ==\n Seq Scan on t\n Execution Time: 1.0 ms\n\n"
        );
        assert_eq!(artifact.path(), path.as_path());
    }
}
