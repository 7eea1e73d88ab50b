//! Metric Extraction
//!
//! Turns the text of one `EXPLAIN (ANALYZE, BUFFERS)` run into
//! `PartialMetrics`. Fields that are not found stay `None`: "no buffer data
//! reported" must stay distinguishable from "zero buffers touched".

use crate::grammar::{COUNTER, CompiledGrammar, SHARED_SECTION, select_grammar};
use querybench_core::{CacheStatus, PartialMetrics};
use serde::{Deserialize, Serialize};

/// Which buffer lines contribute to the shared counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferSelection {
    /// Sum every buffer line of the report
    #[default]
    Sum,
    /// Use only the root plan node's line: the last line at the smallest
    /// indentation above the `Planning:` section
    TopLevel,
}

/// Shared-buffer counters of one or more buffer lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SharedCounters {
    read: u64,
    hit: u64,
    dirtied: u64,
}

/// Parses plan text according to the recognized grammars
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricExtractor {
    selection: BufferSelection,
}

impl MetricExtractor {
    /// Extractor using the given buffer selection
    pub fn new(selection: BufferSelection) -> Self {
        Self { selection }
    }

    /// Extract metrics from raw plan text
    pub fn extract(&self, raw_text: &str) -> PartialMetrics {
        let Some(grammar) = select_grammar(raw_text) else {
            return PartialMetrics::absent();
        };

        let exec_ms = raw_text.lines().find_map(|line| {
            grammar
                .time
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        });

        let counters = match self.selection {
            BufferSelection::Sum => sum_buffers(grammar, raw_text),
            BufferSelection::TopLevel => top_level_buffers(grammar, raw_text),
        };

        let (shared_read, shared_hit, shared_dirtied) = match counters {
            Some(c) => (Some(c.read), Some(c.hit), Some(c.dirtied)),
            None => (None, None, None),
        };

        PartialMetrics {
            exec_ms,
            shared_read,
            shared_hit,
            shared_dirtied,
            cache_status: CacheStatus::classify(shared_read, shared_hit),
        }
    }
}

/// Extract with the default (summing) extractor
pub fn extract(raw_text: &str) -> PartialMetrics {
    MetricExtractor::default().extract(raw_text)
}

fn sum_buffers(grammar: &CompiledGrammar, text: &str) -> Option<SharedCounters> {
    text.lines()
        .filter_map(|line| buffer_counters(grammar, line))
        .fold(None, |acc: Option<SharedCounters>, c| {
            let acc = acc.unwrap_or_default();
            Some(SharedCounters {
                read: acc.read.saturating_add(c.read),
                hit: acc.hit.saturating_add(c.hit),
                dirtied: acc.dirtied.saturating_add(c.dirtied),
            })
        })
}

fn top_level_buffers(grammar: &CompiledGrammar, text: &str) -> Option<SharedCounters> {
    let lines: Vec<&str> = text.lines().collect();
    let planning_start = lines
        .iter()
        .position(|line| line.trim() == "Planning:")
        .unwrap_or(lines.len());

    let candidates = |slice: &[&'_ str]| -> Vec<(usize, String)> {
        slice
            .iter()
            .filter(|line| grammar.buffers.is_match(line))
            .map(|line| (indent(line), line.to_string()))
            .collect()
    };

    let mut buffer_lines = candidates(&lines[..planning_start]);
    if buffer_lines.is_empty() {
        buffer_lines = candidates(&lines);
    }

    let min_indent = buffer_lines.iter().map(|(i, _)| *i).min()?;
    let (_, root_line) = buffer_lines
        .iter()
        .rev()
        .find(|(i, _)| *i == min_indent)?;
    buffer_counters(grammar, root_line)
}

/// Counters of the `shared` section of one buffer line, if it has one
fn buffer_counters(grammar: &CompiledGrammar, line: &str) -> Option<SharedCounters> {
    let list = grammar.buffers.captures(line)?.get(1)?.as_str();
    let section = SHARED_SECTION.as_ref()?.captures(list)?.get(1)?.as_str();
    let counter = COUNTER.as_ref()?;

    let mut counters = SharedCounters::default();
    for caps in counter.captures_iter(section) {
        let Some(value) = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok()) else {
            continue;
        };
        match caps.get(1).map(|m| m.as_str()) {
            Some("hit") => counters.hit = value,
            Some("read") => counters.read = value,
            Some("dirtied") => counters.dirtied = value,
            _ => {}
        }
    }
    Some(counters)
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}
