//! Percentile Computation
//!
//! Nearest-rank percentiles over raw samples. Every reported percentile is an
//! observed value; nothing is interpolated, so p99 of a small sample is its
//! slowest run rather than a value no run ever produced.

/// Percentiles reported per aggregate row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    /// 50th percentile (median)
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
}

/// Compute a single nearest-rank percentile
///
/// The rank is `ceil(p * n / 100)`, clamped to `[1, n]`, and the result is the
/// sample at that rank in ascending order. Returns `None` for an empty sample.
///
/// # Examples
///
/// ```
/// # use querybench_stats::compute_percentile;
/// let samples = [10.0, 20.0, 30.0, 40.0, 50.0];
/// assert_eq!(compute_percentile(&samples, 50.0), Some(30.0));
/// assert_eq!(compute_percentile(&samples, 99.0), Some(50.0));
/// ```
pub fn compute_percentile(samples: &[f64], percentile: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[rank_index(sorted.len(), percentile)])
}

/// Compute p50, p95 and p99 with a single sort
pub fn compute_percentiles(samples: &[f64]) -> Option<Percentiles> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    Some(Percentiles {
        p50: sorted[rank_index(n, 50.0)],
        p95: sorted[rank_index(n, 95.0)],
        p99: sorted[rank_index(n, 99.0)],
    })
}

/// Zero-based index of the nearest rank for `n > 0` samples
fn rank_index(n: usize, percentile: f64) -> usize {
    // p * n first keeps integer percentiles exact
    let rank = (percentile * n as f64 / 100.0).ceil();
    let rank = if rank.is_nan() || rank < 1.0 {
        1
    } else {
        (rank as usize).min(n)
    };
    rank - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank() {
        let samples = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(compute_percentile(&samples, 50.0), Some(30.0));
        assert_eq!(compute_percentile(&samples, 99.0), Some(50.0));
    }

    #[test]
    fn test_unsorted_input() {
        let samples = vec![50.0, 10.0, 40.0, 20.0, 30.0];
        let p = compute_percentiles(&samples).unwrap();
        assert!((p.p50 - 30.0).abs() < f64::EPSILON);
        assert!((p.p95 - 50.0).abs() < f64::EPSILON);
        assert!((p.p99 - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_exact_rank_boundaries() {
        let samples: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let p = compute_percentiles(&samples).unwrap();
        assert!((p.p50 - 50.0).abs() < f64::EPSILON);
        assert!((p.p95 - 95.0).abs() < f64::EPSILON);
        assert!((p.p99 - 99.0).abs() < f64::EPSILON);

        let twenty: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        assert_eq!(compute_percentile(&twenty, 95.0), Some(19.0));
    }

    #[test]
    fn test_single_sample() {
        let p = compute_percentiles(&[42.0]).unwrap();
        assert!((p.p50 - 42.0).abs() < f64::EPSILON);
        assert!((p.p99 - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_clamped() {
        let samples = vec![3.0, 1.0, 2.0];
        assert_eq!(compute_percentile(&samples, 0.0), Some(1.0));
        assert_eq!(compute_percentile(&samples, 100.0), Some(3.0));
        assert_eq!(compute_percentile(&samples, 250.0), Some(3.0));
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(compute_percentile(&[], 50.0), None);
        assert!(compute_percentiles(&[]).is_none());
    }

    #[test]
    fn test_value_is_observed() {
        let samples = vec![1.0, 100.0];
        let p50 = compute_percentile(&samples, 50.0).unwrap();
        assert!(samples.contains(&p50));
    }
}
