//! Aggregation
//!
//! Groups run records by `(sql, caseId)` and computes completion rate,
//! nearest-rank latency percentiles and mean buffer counters per group.
//!
//! Aggregation only reads a frozen snapshot, so per-group statistics are
//! computed in parallel with rayon; row order is fixed before the parallel
//! step and preserved by `collect`.

use fxhash::FxHashMap;
use querybench_core::RunRecord;
use querybench_stats::{compute_percentiles, compute_summary, mean_of_present};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which records an aggregate covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every record of the session
    Total,
    /// Only records of the given one-based round number
    Round(u32),
}

impl Scope {
    /// Whether a record falls into this scope
    pub fn contains(&self, record: &RunRecord) -> bool {
        match self {
            Scope::Total => true,
            Scope::Round(round) => record.round == *round,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Total => f.write_str("total"),
            Scope::Round(round) => write!(f, "round {}", round),
        }
    }
}

/// Statistics of one `(sql, caseId)` group within a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub sql: String,
    pub case_id: String,
    /// Size category of the case, from the first record that carries one
    pub category: String,
    pub scope: Scope,
    /// Records in the group, including timed-out, failed and unparsed runs
    pub sample_count: usize,
    /// Records with an execution time
    pub completed_count: usize,
    /// `completed_count / sample_count`
    pub completion_rate: f64,
    pub p50: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub mean_exec_ms: Option<f64>,
    pub min_exec_ms: Option<f64>,
    pub max_exec_ms: Option<f64>,
    pub mean_shared_read: Option<f64>,
    pub mean_shared_hit: Option<f64>,
    pub mean_shared_dirtied: Option<f64>,
}

impl AggregateRow {
    /// Whether some runs of the group produced no timing
    pub fn is_incomplete(&self) -> bool {
        self.completed_count < self.sample_count
    }
}

/// Aggregate the records of one scope.
///
/// Rows are ordered by `sql` in first-seen order of the input, then by
/// `caseId` in first-seen order. Pairs without records in the scope do not
/// appear.
pub fn aggregate(records: &[RunRecord], scope: Scope) -> Vec<AggregateRow> {
    let mut sql_rank: FxHashMap<&str, usize> = FxHashMap::default();
    let mut case_rank: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: FxHashMap<(&str, &str), Vec<&RunRecord>> = FxHashMap::default();

    for record in records.iter().filter(|r| scope.contains(r)) {
        let next = sql_rank.len();
        sql_rank.entry(record.sql.as_str()).or_insert(next);
        let next = case_rank.len();
        case_rank.entry(record.case_id.as_str()).or_insert(next);
        groups
            .entry((record.sql.as_str(), record.case_id.as_str()))
            .or_default()
            .push(record);
    }

    let mut keys: Vec<(&str, &str)> = groups.keys().copied().collect();
    keys.sort_by_key(|(sql, case_id)| {
        (
            sql_rank.get(sql).copied().unwrap_or(usize::MAX),
            case_rank.get(case_id).copied().unwrap_or(usize::MAX),
        )
    });

    keys.par_iter()
        .map(|key| {
            let members = groups.get(key).map(Vec::as_slice).unwrap_or_default();
            aggregate_group(key.0, key.1, scope, members)
        })
        .collect()
}

fn aggregate_group(sql: &str, case_id: &str, scope: Scope, records: &[&RunRecord]) -> AggregateRow {
    let exec: Vec<f64> = records.iter().filter_map(|r| r.exec_ms).collect();
    let percentiles = compute_percentiles(&exec);
    let summary = compute_summary(&exec);

    let sample_count = records.len();
    let completed_count = exec.len();
    let completion_rate = if sample_count == 0 {
        0.0
    } else {
        completed_count as f64 / sample_count as f64
    };

    let category = records
        .iter()
        .map(|r| r.category.as_str())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string();

    let mean_counter = |field: fn(&RunRecord) -> Option<u64>| {
        mean_of_present(records.iter().map(|&r| field(r).map(|v| v as f64)))
    };

    AggregateRow {
        sql: sql.to_string(),
        case_id: case_id.to_string(),
        category,
        scope,
        sample_count,
        completed_count,
        completion_rate,
        p50: percentiles.map(|p| p.p50),
        p95: percentiles.map(|p| p.p95),
        p99: percentiles.map(|p| p.p99),
        mean_exec_ms: summary.map(|s| s.mean),
        min_exec_ms: summary.map(|s| s.min),
        max_exec_ms: summary.map(|s| s.max),
        mean_shared_read: mean_counter(|r| r.shared_read),
        mean_shared_hit: mean_counter(|r| r.shared_hit),
        mean_shared_dirtied: mean_counter(|r| r.shared_dirtied),
    }
}
