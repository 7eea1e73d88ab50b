//! Session Driver
//!
//! Walks iterations one at a time: fetch the iteration's case catalog, plan
//! its rounds, then run every variant of each round's order against every
//! case, appending each record to the store as soon as it exists.
//!
//! A shared cancel flag is checked before each run. On cancel the driver
//! stops and returns normally; everything recorded so far stays in the store.

use super::execution::RunExecutor;
use super::runner::QueryRunner;
use crate::planner::{SchedulingError, plan};
use indicatif::{ProgressBar, ProgressStyle};
use querybench_core::{CaseSource, CatalogError, IterationContext, ResultStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Session-level failures; per-run problems are recorded, not raised
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Iteration {iteration}: {source}")]
    Catalog {
        iteration: u32,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shape of a session
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Number of iterations
    pub iterations: u32,
    /// Seed of iteration 0
    pub base_seed: u64,
    /// Rounds per iteration
    pub rounds_per_iteration: u32,
    /// Variant names in base order
    pub variants: Vec<String>,
}

/// What a finished (or stopped) session did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Runs executed
    pub runs: usize,
    /// Whether the cancel flag stopped the session early
    pub interrupted: bool,
}

/// Runs a session against an executor and a store
pub struct Session<'a, R: QueryRunner> {
    plan: &'a SessionPlan,
    cases: &'a dyn CaseSource,
    executor: &'a mut RunExecutor<R>,
    store: &'a mut ResultStore,
    cancel: &'a AtomicBool,
    show_progress: bool,
}

impl<'a, R: QueryRunner> Session<'a, R> {
    /// Assemble a session
    pub fn new(
        plan: &'a SessionPlan,
        cases: &'a dyn CaseSource,
        executor: &'a mut RunExecutor<R>,
        store: &'a mut ResultStore,
        cancel: &'a AtomicBool,
    ) -> Self {
        Self {
            plan,
            cases,
            executor,
            store,
            cancel,
            show_progress: false,
        }
    }

    /// Show a progress bar over each iteration's runs
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Execute every planned run, or until the cancel flag is set
    pub fn run(self) -> Result<SessionOutcome, SessionError> {
        let shape = self.plan;
        // Validate up front so bad input fails before any run
        plan(&shape.variants, 0, shape.rounds_per_iteration)?;

        let mut runs = 0;
        for index in 0..shape.iterations {
            let context = IterationContext::new(index, shape.base_seed, shape.rounds_per_iteration);
            let catalog = self
                .cases
                .catalog(&context)
                .map_err(|source| SessionError::Catalog {
                    iteration: index,
                    source,
                })?;
            let rounds = plan(&shape.variants, context.index, context.rounds_per_iteration)?;

            tracing::info!(
                "Iteration {}/{} (seed {}): {} cases, {} variants, {} rounds",
                index + 1,
                shape.iterations,
                context.seed,
                catalog.len(),
                shape.variants.len(),
                rounds.len()
            );

            let total = rounds.len() * shape.variants.len() * catalog.len();
            let pb = progress_bar(total as u64, self.show_progress);

            for round in &rounds {
                tracing::info!(
                    "Round {}/{} ({:?}, offset {}): {}",
                    round.round,
                    shape.rounds_per_iteration,
                    round.direction,
                    round.offset,
                    round.order.join(", ")
                );

                for (slot, sql) in round.order.iter().enumerate() {
                    let position = slot as u32 + 1;
                    for case in catalog.cases() {
                        if self.cancel.load(Ordering::SeqCst) {
                            pb.abandon_with_message("Interrupted");
                            tracing::warn!("Interrupted after {} runs", runs);
                            return Ok(SessionOutcome {
                                runs,
                                interrupted: true,
                            });
                        }

                        pb.set_message(format!("{} on {}", sql, case.case_id));
                        let record = self.executor.execute(&context, round, position, case);
                        self.store.append(record)?;
                        runs += 1;
                        pb.inc(1);
                    }
                }
            }

            pb.finish_with_message("Complete");
        }

        Ok(SessionOutcome {
            runs,
            interrupted: false,
        })
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
