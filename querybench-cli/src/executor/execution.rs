//! Run Execution
//!
//! Drives one (iteration, round, variant, case) combination through the
//! query runner and turns the outcome into a `RunRecord`.
//!
//! ## Data Flow
//!
//! ```text
//! RoundPlan + position + Case
//!        │
//!        ▼
//!   SqlVariant::render(case payload)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │   QueryRunner    │  Completed / TimedOut / Failed
//! └────────┬─────────┘
//!          │
//!          ▼
//!   MetricExtractor ──► RunRecord ──► ExplainArtifact (completed runs)
//! ```

use super::artifact::ExplainArtifact;
use super::runner::{QueryRunner, RunOutcome};
use querybench_core::{
    Case, IterationContext, RoundPlan, RunRecord, RunSlot, SizeThresholds, SqlVariant,
};
use querybench_explain::MetricExtractor;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for run execution
#[derive(Debug, Clone, Copy)]
pub struct ExecutionConfig {
    /// Per-query timeout
    pub timeout: Duration,
    /// Plan text parser
    pub extractor: MetricExtractor,
    /// Case size category thresholds
    pub thresholds: SizeThresholds,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            extractor: MetricExtractor::default(),
            thresholds: SizeThresholds::default(),
        }
    }
}

/// Executes single runs against a query runner
pub struct RunExecutor<R: QueryRunner> {
    runner: R,
    config: ExecutionConfig,
    variants: HashMap<String, SqlVariant>,
    artifact: Option<ExplainArtifact>,
}

impl<R: QueryRunner> RunExecutor<R> {
    /// Create an executor for the given variants
    pub fn new(runner: R, variants: &[SqlVariant], config: ExecutionConfig) -> Self {
        Self {
            runner,
            config,
            variants: variants
                .iter()
                .map(|v| (v.name.clone(), v.clone()))
                .collect(),
            artifact: None,
        }
    }

    /// Append the plan text of every completed run to `artifact`
    pub fn with_artifact(mut self, artifact: ExplainArtifact) -> Self {
        self.artifact = Some(artifact);
        self
    }

    /// Run the variant at one-based `position` of `plan` against `case`.
    ///
    /// Never fails: timeouts, runner errors and unparseable output are all
    /// recorded in the returned record.
    pub fn execute(
        &mut self,
        context: &IterationContext,
        plan: &RoundPlan,
        position: u32,
        case: &Case,
    ) -> RunRecord {
        let sql_name = position
            .checked_sub(1)
            .and_then(|index| plan.order.get(index as usize))
            .map(String::as_str)
            .unwrap_or("");
        let category = case.category(&self.config.thresholds);
        let slot = RunSlot {
            context,
            plan,
            position,
            sql: sql_name,
            case_id: &case.case_id,
            category: &category,
        };

        let Some(variant) = self.variants.get(sql_name) else {
            return RunRecord::failed(
                slot,
                format!("No SQL variant at position {} of round {}", position, plan.round),
                String::new(),
            );
        };

        let payload = match case.payload() {
            Ok(payload) => payload,
            Err(e) => {
                return RunRecord::failed(
                    slot,
                    format!("Failed to encode case payload: {}", e),
                    String::new(),
                );
            }
        };
        let sql = variant.render(&payload);

        tracing::debug!(
            "Running {} on {} (iteration {}, round {}, position {})",
            sql_name,
            case.case_id,
            context.index,
            plan.round,
            position
        );

        match self.runner.run(&sql, self.config.timeout) {
            RunOutcome::Completed(text) => {
                let metrics = self.config.extractor.extract(&text);
                let record = RunRecord::completed(slot, metrics, text);
                if record.is_parse_failure() {
                    tracing::warn!(
                        "No plan metrics recognized for {} on {}",
                        sql_name,
                        case.case_id
                    );
                }
                self.write_artifact(&record);
                record
            }
            RunOutcome::TimedOut => {
                tracing::warn!(
                    "Timeout after {:?}: {} on {}",
                    self.config.timeout,
                    sql_name,
                    case.case_id
                );
                RunRecord::timed_out(slot)
            }
            RunOutcome::Failed { message, output } => {
                tracing::warn!("SQL error for {} on {}: {}", sql_name, case.case_id, message);
                RunRecord::failed(slot, message, output)
            }
        }
    }

    fn write_artifact(&mut self, record: &RunRecord) {
        let Some(artifact) = self.artifact.as_mut() else {
            return;
        };
        if let Err(e) = artifact.append(record) {
            tracing::warn!("Failed to append to {}: {}", artifact.path().display(), e);
        }
    }
}
