#![warn(missing_docs)]
//! QueryBench Explain - Plan Report Parsing
//!
//! Recovers execution time and shared-buffer counters from the text of
//! `EXPLAIN (ANALYZE, BUFFERS)` runs.
//!
//! - Versioned grammars: every recognized marker lives in one table
//! - Missing fields stay absent instead of defaulting to zero
//! - Buffer counters either summed over all plan nodes or taken from the root

mod clean;
mod extract;
mod grammar;

pub use clean::clean_plan_output;
pub use extract::{BufferSelection, MetricExtractor, extract};
pub use grammar::{GRAMMARS, Grammar, detect_grammar};
