#![warn(missing_docs)]
//! QueryBench Core - Data Model and Session State
//!
//! This crate holds the types every stage of a benchmark session shares:
//! - `Case`, `SqlVariant`: immutable inputs
//! - `IterationContext`, `RoundPlan`: where a run sits in the session
//! - `RunRecord`, `PartialMetrics`, `CacheStatus`: what a run measured
//! - `CaseCatalog`, `CaseSource`: per-iteration case loading
//! - `ResultStore`: append-only record collection with a snapshot read

mod catalog;
mod model;
mod store;

pub use catalog::{CaseCatalog, CaseSource, CatalogError, DirectoryCaseSource};
pub use model::{
    CacheStatus, Case, CaseGroup, Direction, EXPLAIN_PREFIX, IterationContext, PLACEHOLDER,
    PartialMetrics, RoundPlan, RunRecord, RunSlot, SizeThresholds, SqlVariant, ensure_explain,
};
pub use store::{ResultStore, StoreError};
