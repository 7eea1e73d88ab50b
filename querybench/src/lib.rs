#![warn(missing_docs)]
//! # QueryBench
//!
//! Benchmark harness comparing alternative SQL formulations of the same query
//! against a relational database.
//!
//! - **Fairness Rotation**: every variant takes every execution position
//!   within an iteration, alternating forward and reverse rounds
//! - **Failure Isolation**: timeouts, runner errors and unparseable plans are
//!   recorded per run; a session never aborts on one bad query
//! - **Plan Metrics**: execution time and shared buffer counters extracted
//!   from `EXPLAIN (ANALYZE, BUFFERS)` text against versioned grammars
//! - **Nearest-Rank Percentiles**: p50/p95/p99 per `(sql, caseId)` for the
//!   whole session and per round
//! - **Interrupt Safety**: results are appended as JSON lines, so a partial
//!   session can be re-aggregated later
//!
//! ## Quick Start
//!
//! ```ignore
//! use querybench::prelude::*;
//!
//! let variants = load_variants(&["queries/".into()])?;
//! let names: Vec<String> = variants.iter().map(|v| v.name.clone()).collect();
//! for round in plan(&names, 0, 2)? {
//!     println!("round {}: {}", round.round, round.order.join(" -> "));
//! }
//! ```

// Re-export core types
pub use querybench_core::{
    CacheStatus, Case, CaseCatalog, CaseGroup, CaseSource, CatalogError, Direction,
    DirectoryCaseSource, EXPLAIN_PREFIX, IterationContext, PLACEHOLDER, PartialMetrics,
    ResultStore, RoundPlan, RunRecord, RunSlot, SizeThresholds, SqlVariant, StoreError,
};

// Re-export plan parsing
pub use querybench_explain::{
    BufferSelection, GRAMMARS, Grammar, MetricExtractor, clean_plan_output, detect_grammar,
    extract,
};

// Re-export stats
pub use querybench_stats::{
    Percentiles, SummaryStatistics, compute_percentile, compute_percentiles, compute_summary,
};

// Re-export reporting
pub use querybench_report::{
    AggregateRow, OutputFormat, ReportConfig, ReportMeta, Scope, SessionReport, aggregate,
    build_session_report,
};

// Re-export the session driver
pub use querybench_cli::{
    ExecutionConfig, PsqlRunner, QueryRunner, RunExecutor, RunOutcome, SchedulingError,
    Session, SessionError, SessionOutcome, SessionPlan, load_variants, plan, plan_session,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CaseCatalog, ExecutionConfig, QueryRunner, ResultStore, RunExecutor, RunOutcome, Scope,
        Session, SessionPlan, SqlVariant, aggregate, build_session_report, load_variants, plan,
    };
}

/// Run the QueryBench CLI.
///
/// ```ignore
/// fn main() -> anyhow::Result<std::process::ExitCode> {
///     querybench::run()
/// }
/// ```
pub use querybench_cli::run;
