//! Session Executor
//!
//! Runs a benchmark session and turns its records into reports.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CaseSource + SqlVariants
//!       │
//!       ▼
//! ┌─────────────┐
//! │   session   │  Iterations → rounds (planner) → variant × case
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  execution  │  QueryRunner → MetricExtractor → RunRecord
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ ResultStore │  results.jsonl, explains_all.txt
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Aggregation, summary.json, terminal output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Single run execution
//! - [`runner`] - `QueryRunner` seam and the psql-backed runner
//! - [`artifact`] - Raw plan text artifact
//! - [`session`] - Iteration and round loop with cancellation
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection
//! - [`report`] - Report rendering and `summary.json`

mod artifact;
mod execution;
mod formatting;
mod metadata;
mod report;
mod runner;
mod session;

// Re-export public API
pub use artifact::{ExplainArtifact, block_header};
pub use execution::{ExecutionConfig, RunExecutor};
pub use formatting::format_human_output;
pub use metadata::build_report_meta;
pub use report::{SUMMARY_FILE, render_report, write_summary};
pub use runner::{PsqlRunner, QueryRunner, RunOutcome};
pub use session::{Session, SessionError, SessionOutcome, SessionPlan};
