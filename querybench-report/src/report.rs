//! Report Data Structures

use crate::aggregate::{AggregateRow, Scope, aggregate};
use chrono::{DateTime, Utc};
use querybench_core::{RunRecord, SizeThresholds};
use serde::{Deserialize, Serialize};

/// Version of the `summary.json` layout
pub const SCHEMA_VERSION: u32 = 1;

/// Complete session report: total scope plus one table per round
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub meta: ReportMeta,
    pub total: Vec<AggregateRow>,
    pub rounds: Vec<RoundTable>,
    pub summary: ReportSummary,
}

/// Aggregates of one round number across all iterations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTable {
    /// One-based round number
    pub round: u32,
    pub rows: Vec<AggregateRow>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub system: SystemInfo,
    pub config: ReportConfig,
}

impl ReportMeta {
    /// Metadata stamped with the current time and no system details
    pub fn new(config: ReportConfig) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            git_commit: None,
            git_branch: None,
            system: SystemInfo::default(),
            config,
        }
    }
}

/// Session configuration captured in report metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub iterations: u32,
    pub base_seed: u64,
    pub rounds_per_iteration: u32,
    pub timeout_ms: u64,
    /// Variant names in base order
    pub variants: Vec<String>,
    pub buffer_selection: String,
    /// Case size category thresholds
    #[serde(default)]
    pub size_thresholds: SizeThresholds,
    /// Whether the session was stopped before all runs finished
    pub interrupted: bool,
}

/// System information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub runs: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub parse_failures: usize,
    /// Distinct `(sql, caseId)` pairs
    pub groups: usize,
    /// Pairs with a completion rate below 1
    pub incomplete_groups: usize,
}

/// Aggregate a session's records into the total scope and one table per
/// round. Rounds `1..=rounds_per_iteration` always get a table, empty when
/// no record of that round exists.
pub fn build_session_report(
    records: &[RunRecord],
    rounds_per_iteration: u32,
    meta: ReportMeta,
) -> SessionReport {
    let total = aggregate(records, Scope::Total);

    let last_round = records
        .iter()
        .map(|r| r.round)
        .max()
        .unwrap_or(0)
        .max(rounds_per_iteration);
    let rounds = (1..=last_round)
        .map(|round| RoundTable {
            round,
            rows: aggregate(records, Scope::Round(round)),
        })
        .collect();

    let summary = ReportSummary {
        runs: records.len(),
        completed: records.iter().filter(|r| r.is_complete()).count(),
        timed_out: records.iter().filter(|r| r.timed_out).count(),
        failed: records.iter().filter(|r| r.error.is_some()).count(),
        parse_failures: records.iter().filter(|r| r.is_parse_failure()).count(),
        groups: total.len(),
        incomplete_groups: total.iter().filter(|row| row.is_incomplete()).count(),
    };

    SessionReport {
        meta,
        total,
        rounds,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failed, record, timed_out};

    #[test]
    fn test_session_report_tables() {
        let records = vec![
            record("a", "c1", 1, Some(1.0)),
            record("b", "c1", 1, Some(2.0)),
            record("b", "c1", 2, Some(3.0)),
            timed_out("a", "c1", 2),
        ];

        let report = build_session_report(&records, 2, ReportMeta::new(ReportConfig::default()));
        assert_eq!(report.total.len(), 2);
        assert_eq!(report.rounds.len(), 2);
        assert_eq!(report.rounds[0].round, 1);
        assert_eq!(report.rounds[1].rows.len(), 2);
        assert_eq!(report.summary.runs, 4);
        assert_eq!(report.summary.completed, 3);
        assert_eq!(report.summary.timed_out, 1);
        assert_eq!(report.summary.incomplete_groups, 1);
    }

    #[test]
    fn test_empty_round_has_empty_table() {
        let records = vec![record("a", "c1", 1, Some(1.0))];

        let report = build_session_report(&records, 3, ReportMeta::new(ReportConfig::default()));
        assert_eq!(report.rounds.len(), 3);
        assert!(report.rounds[1].rows.is_empty());
        assert!(report.rounds[2].rows.is_empty());
    }

    #[test]
    fn test_summary_counts_failure_kinds() {
        let records = vec![
            record("a", "c1", 1, None),
            failed("a", "c1", 1),
            timed_out("a", "c1", 1),
        ];

        let summary = build_session_report(&records, 1, ReportMeta::new(ReportConfig::default()))
            .summary;
        assert_eq!(summary.parse_failures, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.groups, 1);
    }
}
