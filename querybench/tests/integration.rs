//! Integration tests for QueryBench
//!
//! These tests drive whole sessions through a scripted query runner and
//! check scheduling, failure isolation, interruption and re-aggregation.

use querybench::{
    CacheStatus, DirectoryCaseSource, ExecutionConfig, QueryRunner, ReportConfig, ReportMeta,
    ResultStore, RunExecutor, RunOutcome, Scope, Session, SessionPlan, SqlVariant, aggregate,
    build_session_report, load_variants,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Answers each query according to the variant marker in its text
struct ScriptedRunner {
    calls: Arc<AtomicUsize>,
    cancel_after: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            cancel_after: None,
        }
    }
}

impl QueryRunner for ScriptedRunner {
    fn run(&mut self, sql: &str, _timeout: Duration) -> RunOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, flag)) = &self.cancel_after {
            if call >= *limit {
                flag.store(true, Ordering::SeqCst);
            }
        }

        if sql.contains("-- slow") {
            RunOutcome::TimedOut
        } else if sql.contains("-- broken") {
            RunOutcome::Failed {
                message: "psql exited with status 3".to_string(),
                output: "ERROR:  syntax error at or near \"SELEC\"".to_string(),
            }
        } else if sql.contains("-- garbled") {
            RunOutcome::Completed("something that is not a plan".to_string())
        } else {
            let ms = if sql.contains("-- fast") { 1.5 } else { 4.0 };
            RunOutcome::Completed(format!(
                " Seq Scan on t  (actual time=0.01..0.02 rows=1 loops=1)\n   Buffers: shared hit={} read=2\n Execution Time: {} ms\n",
                call, ms
            ))
        }
    }
}

fn write_cases(dir: &Path) {
    std::fs::write(
        dir.join("c1.json"),
        r#"[{"Parties": ["p1"], "Services": ["s1"]}]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("c2.json"),
        r#"[{"Parties": ["p1", "p2"], "Services": ["s1"]}]"#,
    )
    .unwrap();
}

fn variant(name: &str, marker: &str) -> SqlVariant {
    SqlVariant::new(
        name,
        format!("-- {}\nSELECT * FROM f('--PARTIESANDSERVICESPLACEHOLDER--');", marker),
    )
    .unwrap()
}

fn session_plan(variants: &[SqlVariant], iterations: u32, rounds: u32) -> SessionPlan {
    SessionPlan {
        iterations,
        base_seed: 100,
        rounds_per_iteration: rounds,
        variants: variants.iter().map(|v| v.name.clone()).collect(),
    }
}

fn run_session(
    variants: &[SqlVariant],
    plan: &SessionPlan,
    runner: ScriptedRunner,
    store: &mut ResultStore,
    cancel: &AtomicBool,
) -> querybench::SessionOutcome {
    let cases = tempfile::tempdir().unwrap();
    write_cases(cases.path());
    let source = DirectoryCaseSource::new(cases.path(), 3);
    let mut executor = RunExecutor::new(runner, variants, ExecutionConfig::default());
    Session::new(plan, &source, &mut executor, store, cancel)
        .run()
        .unwrap()
}

/// Two variants, two rounds: forward then reverse, rotation advancing per iteration
#[test]
fn test_rotation_scenario_order() {
    let variants = vec![variant("A", "fast"), variant("B", "plain")];
    let plan = session_plan(&variants, 2, 2);
    let mut store = ResultStore::new();
    let cancel = AtomicBool::new(false);

    let outcome = run_session(&variants, &plan, ScriptedRunner::new(), &mut store, &cancel);
    assert!(!outcome.interrupted);
    assert_eq!(outcome.runs, 2 * 2 * 2 * 2);

    let order: Vec<(u32, u32, u32, &str, &str)> = store
        .snapshot()
        .iter()
        .map(|r| (r.iteration, r.round, r.position, r.sql.as_str(), r.case_id.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (0, 1, 1, "A", "c1"),
            (0, 1, 1, "A", "c2"),
            (0, 1, 2, "B", "c1"),
            (0, 1, 2, "B", "c2"),
            (0, 2, 1, "B", "c1"),
            (0, 2, 1, "B", "c2"),
            (0, 2, 2, "A", "c1"),
            (0, 2, 2, "A", "c2"),
            (1, 1, 1, "B", "c1"),
            (1, 1, 1, "B", "c2"),
            (1, 1, 2, "A", "c1"),
            (1, 1, 2, "A", "c2"),
            (1, 2, 1, "A", "c1"),
            (1, 2, 1, "A", "c2"),
            (1, 2, 2, "B", "c1"),
            (1, 2, 2, "B", "c2"),
        ]
    );

    // Both cases are small under the default thresholds
    assert!(store.snapshot().iter().all(|r| r.category == "lpc/lsc"));

    // Seeds follow the iteration index
    assert!(store.snapshot()[..8].iter().all(|r| r.seed == 100));
    assert!(store.snapshot()[8..].iter().all(|r| r.seed == 101));
}

/// Every variant takes every position equally often within an iteration
#[test]
fn test_positions_are_balanced() {
    let variants = vec![
        variant("v1", "plain"),
        variant("v2", "plain"),
        variant("v3", "plain"),
    ];
    let plan = session_plan(&variants, 1, 6);
    let mut store = ResultStore::new();
    let cancel = AtomicBool::new(false);
    run_session(&variants, &plan, ScriptedRunner::new(), &mut store, &cancel);

    for name in ["v1", "v2", "v3"] {
        for position in 1..=3 {
            let count = store
                .snapshot()
                .iter()
                .filter(|r| r.sql == name && r.position == position && r.case_id == "c1")
                .count();
            assert_eq!(count, 2, "{} at position {}", name, position);
        }
    }
}

/// Timeouts, runner errors and unparseable output are recorded, not fatal
#[test]
fn test_failures_are_isolated() {
    let variants = vec![
        variant("ok", "fast"),
        variant("slow", "slow"),
        variant("broken", "broken"),
        variant("garbled", "garbled"),
    ];
    let plan = session_plan(&variants, 1, 2);
    let mut store = ResultStore::new();
    let cancel = AtomicBool::new(false);
    let outcome = run_session(&variants, &plan, ScriptedRunner::new(), &mut store, &cancel);
    assert_eq!(outcome.runs, 4 * 2 * 2);

    let report = build_session_report(store.snapshot(), 2, ReportMeta::new(ReportConfig::default()));
    assert_eq!(report.summary.runs, 16);
    assert_eq!(report.summary.completed, 4);
    assert_eq!(report.summary.timed_out, 4);
    assert_eq!(report.summary.failed, 4);
    assert_eq!(report.summary.parse_failures, 4);
    assert_eq!(report.summary.incomplete_groups, 6);

    let ok = report.total.iter().find(|r| r.sql == "ok" && r.case_id == "c1").unwrap();
    assert_eq!(ok.completion_rate, 1.0);
    assert_eq!(ok.p50, Some(1.5));

    let slow = report.total.iter().find(|r| r.sql == "slow").unwrap();
    assert_eq!(slow.completion_rate, 0.0);
    assert_eq!(slow.p99, None);

    let broken = store.snapshot().iter().find(|r| r.sql == "broken").unwrap();
    assert!(broken.error.as_deref().unwrap_or("").contains("status 3"));
    assert!(broken.raw_text.contains("syntax error"));

    let garbled = store.snapshot().iter().find(|r| r.sql == "garbled").unwrap();
    assert!(garbled.is_parse_failure());
    assert_eq!(garbled.cache_status, CacheStatus::Unknown);
}

/// A cancelled session keeps what it ran and aggregates it consistently
#[test]
fn test_interrupted_session_aggregates_partial_results() {
    let variants = vec![variant("A", "fast"), variant("B", "plain")];
    let plan = session_plan(&variants, 3, 2);
    let mut store = ResultStore::new();
    let cancel = Arc::new(AtomicBool::new(false));
    let runner = ScriptedRunner {
        calls: Arc::new(AtomicUsize::new(0)),
        cancel_after: Some((5, Arc::clone(&cancel))),
    };

    let outcome = run_session(&variants, &plan, runner, &mut store, &cancel);
    assert!(outcome.interrupted);
    assert_eq!(outcome.runs, 5);
    assert_eq!(store.len(), 5);

    let total = aggregate(store.snapshot(), Scope::Total);
    let samples: usize = total.iter().map(|r| r.sample_count).sum();
    assert_eq!(samples, 5);

    let round_two = aggregate(store.snapshot(), Scope::Round(2));
    assert_eq!(round_two.len(), 1);
    assert_eq!(round_two[0].sql, "B");
    assert_eq!(round_two[0].case_id, "c1");
}

/// The JSON-lines results file reproduces the in-memory report
#[test]
fn test_results_file_reaggregates_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.jsonl");
    let variants = vec![variant("A", "fast"), variant("B", "slow")];
    let plan = session_plan(&variants, 2, 2);
    let cancel = AtomicBool::new(false);

    let mut store = ResultStore::with_results_file(&path).unwrap();
    run_session(&variants, &plan, ScriptedRunner::new(), &mut store, &cancel);
    let live = build_session_report(store.snapshot(), 2, ReportMeta::new(ReportConfig::default()));
    drop(store);

    let loaded = ResultStore::load(&path).unwrap();
    let reloaded = build_session_report(loaded.snapshot(), 2, ReportMeta::new(ReportConfig::default()));
    assert_eq!(live.total, reloaded.total);
    assert_eq!(live.rounds, reloaded.rounds);
    assert_eq!(live.summary, reloaded.summary);
}

/// Variant loading from a directory feeds straight into a session
#[test]
fn test_variants_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("b_join.sql"),
        "-- plain\nSELECT 1 FROM f('--PARTIESANDSERVICESPLACEHOLDER--');",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("a_exists.sql"),
        "-- fast\nSELECT 1 FROM g('--PARTIESANDSERVICESPLACEHOLDER--');",
    )
    .unwrap();

    let variants = load_variants(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["a_exists", "b_join"]);

    let plan = session_plan(&variants, 1, 1);
    let mut store = ResultStore::new();
    let cancel = AtomicBool::new(false);
    run_session(&variants, &plan, ScriptedRunner::new(), &mut store, &cancel);
    assert_eq!(store.snapshot()[0].sql, "a_exists");
    assert_eq!(store.snapshot()[0].exec_ms, Some(1.5));
    assert_eq!(store.snapshot()[0].shared_read, Some(2));
}
