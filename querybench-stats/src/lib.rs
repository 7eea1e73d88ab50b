#![warn(missing_docs)]
//! QueryBench Statistics
//!
//! Small, dependency-free statistics used by the aggregator:
//! - Nearest-rank percentiles (always an observed value)
//! - Count, mean and extremes of a sample
//! - Means over partially missing values

mod percentiles;
mod summary;

pub use percentiles::{Percentiles, compute_percentile, compute_percentiles};
pub use summary::{SummaryStatistics, compute_summary, mean_of_present};
