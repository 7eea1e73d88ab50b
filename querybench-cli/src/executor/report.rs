//! Report Output
//!
//! Renders a `SessionReport` in the selected terminal format and writes the
//! machine-readable `summary.json` next to the session's other outputs.

use super::formatting::format_human_output;
use querybench_report::{OutputFormat, SessionReport, generate_json_report};
use std::path::{Path, PathBuf};

/// File name of the aggregated report inside the output directory
pub const SUMMARY_FILE: &str = "summary.json";

/// Render a report for the terminal
pub fn render_report(
    report: &SessionReport,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Human => Ok(format_human_output(report)),
    }
}

/// Write `summary.json` into `dir`, returning its path
pub fn write_summary(dir: &Path, report: &SessionReport) -> anyhow::Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    std::fs::write(&path, generate_json_report(report)?)?;
    Ok(path)
}
