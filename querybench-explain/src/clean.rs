//! Plan text cleanup for the explain artifact

/// Strip the `QUERY PLAN` header and dash-only separator lines that psql
/// prints around a plan report. Every other line is kept as-is.
pub fn clean_plan_output(output: &str) -> String {
    output
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed != "QUERY PLAN" && !(!trimmed.is_empty() && trimmed.chars().all(|c| c == '-'))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_header_and_rule() {
        let raw = "      QUERY PLAN\n--------------\n Seq Scan on t\n   Buffers: shared hit=1\n\n Execution Time: 0.1 ms";
        assert_eq!(
            clean_plan_output(raw),
            " Seq Scan on t\n   Buffers: shared hit=1\n\n Execution Time: 0.1 ms"
        );
    }

    #[test]
    fn test_keeps_lines_with_dashes_inside() {
        let raw = "->  Index Scan using t_pkey on t\n-- comment";
        assert_eq!(clean_plan_output(raw), raw);
    }
}
