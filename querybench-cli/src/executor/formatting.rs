//! Output Formatting
//!
//! Human-readable terminal report:
//! - Total scope table, grouped by SQL variant
//! - One table per round, so round-to-round cache effects stay visible
//! - `⚠` with the completion percentage on every incomplete group
//! - Run, failure and group counts

use querybench_report::{AggregateRow, SessionReport};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &SessionReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("QueryBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    push_table(&mut output, "Total", &report.total);

    for table in &report.rounds {
        push_table(&mut output, &format!("Round {}", table.round), &table.rows);
    }

    let summary = &report.summary;
    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Runs: {}  Completed: {}  Timed out: {}  Failed: {}  Unparsed: {}\n",
        summary.runs, summary.completed, summary.timed_out, summary.failed, summary.parse_failures
    ));
    output.push_str(&format!(
        "  Groups: {}  Incomplete: {}\n",
        summary.groups, summary.incomplete_groups
    ));
    if report.meta.config.interrupted {
        output.push_str("  ⚠ Session interrupted; results are partial\n");
    }

    output
}

fn push_table(output: &mut String, title: &str, rows: &[AggregateRow]) {
    output.push_str(&format!("{}\n", title));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    if rows.is_empty() {
        output.push_str("  (no runs)\n\n");
        return;
    }

    let case_width = rows.iter().map(|r| r.case_id.len()).max().unwrap_or(8).max(8);
    let category_width = rows.iter().map(|r| r.category.len()).max().unwrap_or(8).max(8);

    let mut current_sql: Option<&str> = None;
    for row in rows {
        if current_sql != Some(row.sql.as_str()) {
            output.push_str(&format!("  {}\n", row.sql));
            output.push_str(&format!(
                "    {:<width$}  {:<cat_width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}\n",
                "case",
                "category",
                "p50 ms",
                "p95 ms",
                "p99 ms",
                "read",
                "hit",
                width = case_width,
                cat_width = category_width
            ));
            current_sql = Some(row.sql.as_str());
        }

        output.push_str(&format!(
            "    {:<width$}  {:<cat_width$}  {:>10}  {:>10}  {:>10}  {:>10}  {:>10}",
            row.case_id,
            row.category,
            format_ms(row.p50),
            format_ms(row.p95),
            format_ms(row.p99),
            format_count(row.mean_shared_read),
            format_count(row.mean_shared_hit),
            width = case_width,
            cat_width = category_width
        ));
        if row.is_incomplete() {
            output.push_str(&format!(
                "  ⚠ {:.0}% completed ({}/{})",
                row.completion_rate * 100.0,
                row.completed_count,
                row.sample_count
            ));
        }
        output.push('\n');
    }
    output.push('\n');
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

fn format_count(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}
