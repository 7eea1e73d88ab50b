//! JSON Output

use crate::report::SessionReport;

/// Generate a prettified JSON report (the `summary.json` contents)
pub fn generate_json_report(report: &SessionReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
