#![warn(missing_docs)]
//! QueryBench Report - Aggregation and Output
//!
//! Turns the frozen record snapshot of a session into reports:
//! - Per `(sql, caseId)` aggregates at total and per-round scope
//! - Session summary with completion and failure counts
//! - JSON (machine-readable `summary.json`)

mod aggregate;
mod json;
mod report;

pub use aggregate::{AggregateRow, Scope, aggregate};
pub use json::generate_json_report;
pub use report::{
    ReportConfig, ReportMeta, ReportSummary, RoundTable, SCHEMA_VERSION, SessionReport,
    SystemInfo, build_session_report,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("human".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
