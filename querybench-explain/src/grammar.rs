//! Recognized Plan Output Grammars
//!
//! Plan text is free-form and changes between engine versions. Every marker
//! the extractor understands is listed here, grouped into versioned grammars.
//! Output that matches none of them is a parse failure, never a guess.

use regex::Regex;
use std::sync::LazyLock;

/// One versioned set of markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    /// Version identifier, recorded when a grammar is selected
    pub version: &'static str,
    /// Line pattern whose first capture is the total execution time in ms
    pub time_marker: &'static str,
    /// Line pattern whose first capture is the buffer counter list
    pub buffer_marker: &'static str,
}

/// Grammars in priority order. A grammar is selected by its time marker;
/// when no time marker appears, the first grammar whose buffer marker matches
/// is used.
pub static GRAMMARS: &[Grammar] = &[
    Grammar {
        version: "pg-explain-text-v2",
        time_marker: r"^\s*Execution Time:\s*([0-9]+(?:\.[0-9]+)?)\s*ms\b",
        buffer_marker: r"^\s*Buffers:\s*(.*)$",
    },
    // Engines before 9.4 report "Total runtime" instead of "Execution Time"
    Grammar {
        version: "pg-explain-text-v1",
        time_marker: r"^\s*Total runtime:\s*([0-9]+(?:\.[0-9]+)?)\s*ms\b",
        buffer_marker: r"^\s*Buffers:\s*(.*)$",
    },
];

pub(crate) struct CompiledGrammar {
    pub(crate) grammar: &'static Grammar,
    pub(crate) time: Regex,
    pub(crate) buffers: Regex,
}

pub(crate) static COMPILED: LazyLock<Vec<CompiledGrammar>> = LazyLock::new(|| {
    GRAMMARS
        .iter()
        .filter_map(|grammar| {
            let time = Regex::new(grammar.time_marker).ok()?;
            let buffers = Regex::new(grammar.buffer_marker).ok()?;
            Some(CompiledGrammar {
                grammar,
                time,
                buffers,
            })
        })
        .collect()
});

/// The `shared` section of a buffer counter list, up to the next comma
pub(crate) static SHARED_SECTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bshared\b([^,]*)").ok());

/// `name=<int>` counters inside a section
pub(crate) static COUNTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(hit|read|dirtied|written)=(\d+)").ok());

/// Time markers decide first; buffer-only output falls back to the first
/// grammar whose buffer marker matches
pub(crate) fn select_grammar(text: &str) -> Option<&'static CompiledGrammar> {
    let compiled: &'static [CompiledGrammar] = &COMPILED;
    compiled
        .iter()
        .find(|g| text.lines().any(|line| g.time.is_match(line)))
        .or_else(|| {
            compiled
                .iter()
                .find(|g| text.lines().any(|line| g.buffers.is_match(line)))
        })
}

/// Select the grammar that recognizes `text`
pub fn detect_grammar(text: &str) -> Option<&'static Grammar> {
    select_grammar(text).map(|compiled| compiled.grammar)
}
