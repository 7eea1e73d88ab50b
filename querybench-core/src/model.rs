//! Benchmark Data Model
//!
//! Immutable inputs (`Case`, `SqlVariant`), per-iteration and per-round
//! context (`IterationContext`, `RoundPlan`) and the measured outcome of a
//! single run (`RunRecord`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Substitution point for the parties/services payload in a SQL template
pub const PLACEHOLDER: &str = "--PARTIESANDSERVICESPLACEHOLDER--";

/// Prefix that turns a query into an analyzed plan report
pub const EXPLAIN_PREFIX: &str = "EXPLAIN (ANALYZE, BUFFERS, TIMING)";

/// One party/service group of a case, serialized with the keys the
/// queries expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseGroup {
    /// Party identifiers of this group
    #[serde(rename = "Parties", default)]
    pub parties: Vec<String>,
    /// Service identifiers of this group
    #[serde(rename = "Services", default)]
    pub services: Vec<String>,
}

/// One synthetic query input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Stable identifier; encodes party/service/group counts, never the seed
    pub case_id: String,
    /// Seed the generator used for this case
    pub seed: u64,
    /// All parties, in generator order
    #[serde(default)]
    pub parties: Vec<String>,
    /// All services, in generator order
    #[serde(default)]
    pub services: Vec<String>,
    /// Per-group split of parties and services
    #[serde(default)]
    pub groups: Vec<CaseGroup>,
}

impl Case {
    /// Build a case from flat party/service lists (single group)
    pub fn new(
        case_id: impl Into<String>,
        seed: u64,
        parties: Vec<String>,
        services: Vec<String>,
    ) -> Self {
        let groups = vec![CaseGroup {
            parties: parties.clone(),
            services: services.clone(),
        }];
        Self {
            case_id: case_id.into(),
            seed,
            parties,
            services,
            groups,
        }
    }

    /// Build a case from the generator's group array, flattening parties and
    /// services in first-seen order
    pub fn from_groups(case_id: impl Into<String>, seed: u64, groups: Vec<CaseGroup>) -> Self {
        let mut parties = Vec::new();
        let mut services = Vec::new();
        for group in &groups {
            for party in &group.parties {
                if !parties.contains(party) {
                    parties.push(party.clone());
                }
            }
            for service in &group.services {
                if !services.contains(service) {
                    services.push(service.clone());
                }
            }
        }
        Self {
            case_id: case_id.into(),
            seed,
            parties,
            services,
            groups,
        }
    }

    /// Fill in the group list for case files that only carry flat lists
    pub fn normalized(mut self) -> Self {
        if self.groups.is_empty() {
            self.groups.push(CaseGroup {
                parties: self.parties.clone(),
                services: self.services.clone(),
            });
        }
        self
    }

    /// Number of distinct parties
    pub fn party_count(&self) -> usize {
        self.parties.iter().collect::<BTreeSet<_>>().len()
    }

    /// Number of distinct services
    pub fn service_count(&self) -> usize {
        self.services.iter().collect::<BTreeSet<_>>().len()
    }

    /// JSON payload substituted into SQL templates
    pub fn payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.groups)
    }

    /// Size category of this case under `thresholds`
    pub fn category(&self, thresholds: &SizeThresholds) -> String {
        thresholds.category(self.party_count(), self.service_count())
    }
}

/// Party and service counts above which a case is "high"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeThresholds {
    /// Cases with more parties are `hpc`, otherwise `lpc`
    pub party_hi: usize,
    /// Cases with more services are `hsc`, otherwise `lsc`
    pub service_hi: usize,
}

impl Default for SizeThresholds {
    fn default() -> Self {
        Self {
            party_hi: 10,
            service_hi: 20,
        }
    }
}

impl SizeThresholds {
    /// `hpc|lpc` and `hsc|lsc` joined by `/`, e.g. `lpc/hsc`
    pub fn category(&self, party_count: usize, service_count: usize) -> String {
        let parties = if party_count > self.party_hi { "hpc" } else { "lpc" };
        let services = if service_count > self.service_hi { "hsc" } else { "lsc" };
        format!("{}/{}", parties, services)
    }
}

/// One candidate query template under comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlVariant {
    /// Variant name (the template file stem)
    pub name: String,
    /// Template text containing exactly one [`PLACEHOLDER`]
    pub template: String,
}

impl SqlVariant {
    /// Create a variant; returns `None` unless the template contains exactly
    /// one placeholder
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Option<Self> {
        let template = template.into();
        if template.matches(PLACEHOLDER).count() != 1 {
            return None;
        }
        Some(Self {
            name: name.into(),
            template: ensure_explain(&template),
        })
    }

    /// Render the query text for a case payload
    pub fn render(&self, payload: &str) -> String {
        self.template.replacen(PLACEHOLDER, payload, 1)
    }
}

/// Prepend [`EXPLAIN_PREFIX`] unless the first non-empty line already has it
pub fn ensure_explain(sql: &str) -> String {
    let first = sql
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    if first.to_uppercase().starts_with(EXPLAIN_PREFIX) {
        sql.to_string()
    } else {
        format!("{}\n{}", EXPLAIN_PREFIX, sql)
    }
}

/// Context of one benchmark iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationContext {
    /// Zero-based iteration index
    pub index: u32,
    /// `base_seed + index`, wrapping at `u64::MAX`
    pub seed: u64,
    /// Number of fairness rounds in this iteration
    pub rounds_per_iteration: u32,
}

impl IterationContext {
    /// Derive the context for iteration `index` of a session
    pub fn new(index: u32, base_seed: u64, rounds_per_iteration: u32) -> Self {
        Self {
            index,
            seed: base_seed.wrapping_add(u64::from(index)),
            rounds_per_iteration,
        }
    }
}

/// Whether a round runs the rotated order as-is or reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Rotated order, first to last
    Forward,
    /// Rotated order, last to first
    Reverse,
}

/// Execution order of all variants for one (iteration, round)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    /// Zero-based iteration index
    pub iteration: u32,
    /// One-based round number
    pub round: u32,
    /// Left-rotation applied to the base order
    pub offset: usize,
    /// Forward or reversed
    pub direction: Direction,
    /// Variant names, a permutation of the full set
    pub order: Vec<String>,
}

/// Coarse classification of a run's buffer activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheStatus {
    /// Reads from disk, no cache hits
    #[serde(rename = "io")]
    Io,
    /// Cache hits only
    #[serde(rename = "cached")]
    Cached,
    /// Neither reads nor hits
    #[serde(rename = "none")]
    None,
    /// Mixed reads and hits, or no buffer data
    #[serde(rename = "?")]
    Unknown,
}

impl CacheStatus {
    /// Classify shared-buffer totals
    pub fn classify(shared_read: Option<u64>, shared_hit: Option<u64>) -> Self {
        match (shared_read, shared_hit) {
            (Some(read), Some(hit)) => match (read > 0, hit > 0) {
                (true, false) => CacheStatus::Io,
                (false, true) => CacheStatus::Cached,
                (false, false) => CacheStatus::None,
                (true, true) => CacheStatus::Unknown,
            },
            _ => CacheStatus::Unknown,
        }
    }

    /// Short label used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Io => "io",
            CacheStatus::Cached => "cached",
            CacheStatus::None => "none",
            CacheStatus::Unknown => "?",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics recovered from one run's plan report; absent fields were not found
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialMetrics {
    pub exec_ms: Option<f64>,
    pub shared_read: Option<u64>,
    pub shared_hit: Option<u64>,
    pub shared_dirtied: Option<u64>,
    pub cache_status: CacheStatus,
}

impl PartialMetrics {
    /// Result for text that matched no recognized marker
    pub fn absent() -> Self {
        Self {
            exec_ms: None,
            shared_read: None,
            shared_hit: None,
            shared_dirtied: None,
            cache_status: CacheStatus::Unknown,
        }
    }

    /// True when nothing could be extracted
    pub fn is_parse_failure(&self) -> bool {
        self.exec_ms.is_none()
            && self.shared_read.is_none()
            && self.shared_hit.is_none()
            && self.shared_dirtied.is_none()
    }
}

/// Measured outcome of one variant against one case within one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub iteration: u32,
    pub seed: u64,
    pub round: u32,
    /// One-based position of `sql` in the round's order
    pub position: u32,
    pub sql: String,
    pub case_id: String,
    /// Size category of the case (`lpc/lsc` ...)
    #[serde(default)]
    pub category: String,
    pub exec_ms: Option<f64>,
    pub shared_read: Option<u64>,
    pub shared_hit: Option<u64>,
    pub shared_dirtied: Option<u64>,
    pub cache_status: CacheStatus,
    pub timed_out: bool,
    /// Execution error reported by the query runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw_text: String,
}

/// Identifies where a run sits in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSlot<'a> {
    pub context: &'a IterationContext,
    pub plan: &'a RoundPlan,
    pub position: u32,
    pub sql: &'a str,
    pub case_id: &'a str,
    pub category: &'a str,
}

impl RunRecord {
    /// Record for a run whose output was captured and parsed
    pub fn completed(slot: RunSlot<'_>, metrics: PartialMetrics, raw_text: String) -> Self {
        Self {
            exec_ms: metrics.exec_ms,
            shared_read: metrics.shared_read,
            shared_hit: metrics.shared_hit,
            shared_dirtied: metrics.shared_dirtied,
            cache_status: metrics.cache_status,
            timed_out: false,
            error: None,
            raw_text,
            ..Self::empty(slot)
        }
    }

    /// Record for a run that hit the timeout
    pub fn timed_out(slot: RunSlot<'_>) -> Self {
        Self {
            timed_out: true,
            ..Self::empty(slot)
        }
    }

    /// Record for a run the query runner reported as failed
    pub fn failed(slot: RunSlot<'_>, message: String, output: String) -> Self {
        Self {
            error: Some(message),
            raw_text: output,
            ..Self::empty(slot)
        }
    }

    fn empty(slot: RunSlot<'_>) -> Self {
        Self {
            iteration: slot.context.index,
            seed: slot.context.seed,
            round: slot.plan.round,
            position: slot.position,
            sql: slot.sql.to_string(),
            case_id: slot.case_id.to_string(),
            category: slot.category.to_string(),
            exec_ms: None,
            shared_read: None,
            shared_hit: None,
            shared_dirtied: None,
            cache_status: CacheStatus::Unknown,
            timed_out: false,
            error: None,
            raw_text: String::new(),
        }
    }

    /// Whether the run produced a usable timing
    pub fn is_complete(&self) -> bool {
        self.exec_ms.is_some()
    }

    /// Whether the runner returned output but no marker was recognized
    pub fn is_parse_failure(&self) -> bool {
        !self.timed_out
            && self.error.is_none()
            && self.exec_ms.is_none()
            && self.shared_read.is_none()
            && self.shared_hit.is_none()
            && self.shared_dirtied.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_parts() -> (IterationContext, RoundPlan) {
        let ctx = IterationContext::new(1, 100, 2);
        let plan = RoundPlan {
            iteration: 1,
            round: 2,
            offset: 1,
            direction: Direction::Reverse,
            order: vec!["a".into(), "b".into()],
        };
        (ctx, plan)
    }

    #[test]
    fn test_iteration_seed() {
        let ctx = IterationContext::new(3, 20260205, 2);
        assert_eq!(ctx.seed, 20260208);
    }

    #[test]
    fn test_variant_requires_single_placeholder() {
        assert!(SqlVariant::new("a", "SELECT 1").is_none());
        let twice = format!("SELECT '{0}', '{0}'", PLACEHOLDER);
        assert!(SqlVariant::new("a", twice).is_none());
        let once = format!("SELECT * FROM f('{}')", PLACEHOLDER);
        assert!(SqlVariant::new("a", once).is_some());
    }

    #[test]
    fn test_ensure_explain() {
        let sql = ensure_explain("SELECT 1");
        assert!(sql.starts_with(EXPLAIN_PREFIX));

        let already = "\n  explain (analyze, buffers, timing)\nSELECT 1";
        assert_eq!(ensure_explain(already), already);
    }

    #[test]
    fn test_render_substitutes_payload() {
        let variant =
            SqlVariant::new("v1", format!("SELECT * FROM f('{}'::jsonb)", PLACEHOLDER)).unwrap();
        let case = Case::new("001-1p-1s-1g", 7, vec!["p1".into()], vec!["s1".into()]);
        let sql = variant.render(&case.payload().unwrap());
        assert!(sql.contains(r#"[{"Parties":["p1"],"Services":["s1"]}]"#));
        assert!(!sql.contains(PLACEHOLDER));
    }

    #[test]
    fn test_from_groups_counts_distinct() {
        let case = Case::from_groups(
            "002-3p-2s-2g",
            1,
            vec![
                CaseGroup {
                    parties: vec!["p1".into(), "p2".into()],
                    services: vec!["s1".into(), "s2".into()],
                },
                CaseGroup {
                    parties: vec!["p3".into()],
                    services: vec!["s2".into()],
                },
            ],
        );
        assert_eq!(case.party_count(), 3);
        assert_eq!(case.service_count(), 2);
        assert_eq!(case.groups.len(), 2);
    }

    #[test]
    fn test_cache_status_classification() {
        assert_eq!(CacheStatus::classify(Some(7), Some(0)), CacheStatus::Io);
        assert_eq!(CacheStatus::classify(Some(0), Some(3)), CacheStatus::Cached);
        assert_eq!(CacheStatus::classify(Some(0), Some(0)), CacheStatus::None);
        assert_eq!(CacheStatus::classify(Some(7), Some(3)), CacheStatus::Unknown);
        assert_eq!(CacheStatus::classify(None, None), CacheStatus::Unknown);
    }

    #[test]
    fn test_cache_status_serializes_as_label() {
        let json = serde_json::to_string(&CacheStatus::Unknown).unwrap();
        assert_eq!(json, "\"?\"");
    }

    #[test]
    fn test_timed_out_record_has_no_metrics() {
        let (ctx, plan) = slot_parts();
        let slot = RunSlot {
            context: &ctx,
            plan: &plan,
            position: 1,
            sql: "b",
            case_id: "001",
            category: "lpc/lsc",
        };
        let record = RunRecord::timed_out(slot);
        assert!(record.timed_out);
        assert!(!record.is_complete());
        assert!(!record.is_parse_failure());
        assert_eq!(record.seed, 101);
        assert_eq!(record.round, 2);
        assert_eq!(record.category, "lpc/lsc");
    }

    #[test]
    fn test_size_categories() {
        let thresholds = SizeThresholds::default();
        assert_eq!(thresholds.category(10, 20), "lpc/lsc");
        assert_eq!(thresholds.category(11, 20), "hpc/lsc");
        assert_eq!(thresholds.category(10, 21), "lpc/hsc");
        assert_eq!(thresholds.category(11, 21), "hpc/hsc");

        let tight = SizeThresholds {
            party_hi: 1,
            service_hi: 1,
        };
        let case = Case::new("c", 1, vec!["p1".into(), "p2".into()], vec!["s1".into()]);
        assert_eq!(case.category(&tight), "hpc/lsc");
    }

    #[test]
    fn test_iteration_seed_wraps() {
        let ctx = IterationContext::new(2, u64::MAX, 2);
        assert_eq!(ctx.seed, 1);
    }

    #[test]
    fn test_record_without_category_loads() {
        let (ctx, plan) = slot_parts();
        let slot = RunSlot {
            context: &ctx,
            plan: &plan,
            position: 1,
            sql: "b",
            case_id: "001",
            category: "hpc/hsc",
        };
        let mut value = serde_json::to_value(RunRecord::timed_out(slot)).unwrap();
        value.as_object_mut().unwrap().remove("category");
        let record: RunRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.category, "");
    }
}
