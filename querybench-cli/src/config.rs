//! Configuration loading from querybench.toml
//!
//! Session settings can be kept in a `querybench.toml` file next to the case
//! and query files. The configuration is discovered by walking up from the
//! current directory; command-line flags override it.

use querybench_core::SizeThresholds;
use querybench_explain::BufferSelection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// QueryBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryBenchConfig {
    /// Iteration and round layout
    #[serde(default)]
    pub session: SessionConfig,
    /// Query runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Plan output parsing
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Iteration and round layout of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of iterations
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Seed of iteration 0; iteration `i` uses `seed + i`
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Fairness rounds per iteration
    #[serde(default = "default_rounds")]
    pub rounds_per_iteration: u32,
    /// Digits of the zero-padded per-iteration case directory names
    #[serde(default = "default_padding")]
    pub padding: usize,
    /// Cases with more parties are categorized `hpc`
    #[serde(default = "default_party_hi")]
    pub party_hi: usize,
    /// Cases with more services are categorized `hsc`
    #[serde(default = "default_service_hi")]
    pub service_hi: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            seed: default_seed(),
            rounds_per_iteration: default_rounds(),
            padding: default_padding(),
            party_hi: default_party_hi(),
            service_hi: default_service_hi(),
        }
    }
}

impl SessionConfig {
    /// Size category thresholds of this session
    pub fn thresholds(&self) -> SizeThresholds {
        SizeThresholds {
            party_hi: self.party_hi,
            service_hi: self.service_hi,
        }
    }
}

fn default_iterations() -> u32 {
    1
}
fn default_seed() -> u64 {
    1
}
fn default_rounds() -> u32 {
    2
}
fn default_padding() -> usize {
    3
}
fn default_party_hi() -> usize {
    10
}
fn default_service_hi() -> usize {
    20
}

/// Query runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout for a single query (e.g., "30s", "2m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// psql executable
    #[serde(default = "default_psql")]
    pub psql: String,
    /// Connection string; `PG_CONNECTION_STRING` is used when unset
    #[serde(default)]
    pub connection: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            psql: default_psql(),
            connection: None,
        }
    }
}

fn default_timeout() -> String {
    "30s".to_string()
}
fn default_psql() -> String {
    "psql".to_string()
}

/// Plan output parsing configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ExtractConfig {
    /// Buffer lines to count: "sum" or "top-level"
    #[serde(default)]
    pub buffers: BufferSelection,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Terminal report format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Output directory; `benchmark-YYYYMMDD-HHMM` when unset
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl QueryBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("querybench.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# QueryBench Configuration

[session]
# Number of iterations (each reads its own case set)
iterations = 1
# Seed of the first iteration; iteration i uses seed + i
seed = 1
# Fairness rounds per iteration (even rounds run the reversed order)
rounds_per_iteration = 2
# Digits of per-iteration case directories, e.g. cases/001
padding = 3
# Size categories: more parties than party_hi is hpc, more services than service_hi is hsc
party_hi = 10
service_hi = 20

[runner]
# Timeout for a single query
timeout = "30s"
# psql executable
psql = "psql"
# Connection string (uncomment to enable; PG_CONNECTION_STRING otherwise)
# connection = "postgresql://localhost/bench"

[extract]
# Buffer counters: "sum" over all plan nodes or "top-level" root node only
buffers = "sum"

[output]
# Terminal report format: human or json
format = "human"
# Output directory (uncomment to enable; benchmark-YYYYMMDD-HHMM otherwise)
# directory = "results"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "30s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}
