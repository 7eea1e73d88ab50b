//! Summary Statistics
//!
//! Count, mean and extremes of the samples that are present. Missing values
//! are skipped, never counted as zero.

/// Count, mean and extremes of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    /// Number of samples
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
}

/// Summarize a sample; `None` when it is empty
pub fn compute_summary(samples: &[f64]) -> Option<SummaryStatistics> {
    if samples.is_empty() {
        return None;
    }

    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });

    Some(SummaryStatistics {
        count: samples.len(),
        mean: samples.iter().sum::<f64>() / samples.len() as f64,
        min,
        max,
    })
}

/// Mean over the values that are present
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let s = compute_summary(&[4.0, 2.0, 6.0]).unwrap();
        assert_eq!(s.count, 3);
        assert!((s.mean - 4.0).abs() < f64::EPSILON);
        assert!((s.min - 2.0).abs() < f64::EPSILON);
        assert!((s.max - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        assert!(compute_summary(&[]).is_none());
    }

    #[test]
    fn test_mean_skips_missing() {
        let mean = mean_of_present([Some(10.0), None, Some(20.0)]).unwrap();
        assert!((mean - 15.0).abs() < f64::EPSILON);
        assert_eq!(mean_of_present([None, None]), None);
    }
}
