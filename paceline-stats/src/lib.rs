#![warn(missing_docs)]
//! Summary statistics for measurement runs.
//!
//! Everything in this crate is a pure function of its input sample set:
//! given the same multiset of durations, [`summarize`] produces bit-identical
//! output regardless of input order. That determinism is what lets a stored
//! record's statistics be recomputed offline from its raw samples.

pub mod outliers;
pub mod percentiles;
pub mod summary;

pub use outliers::{count_outliers, outlier_bounds};
pub use percentiles::percentile_of_sorted;
pub use summary::{summarize, summarize_with, SummaryOptions, SummaryStatistics};

/// Fraction trimmed from each tail before computing the trimmed mean.
pub const DEFAULT_TRIM_FRACTION: f64 = 0.10;

/// IQR multiplier for the outlier bound around the median.
pub const DEFAULT_OUTLIER_K: f64 = 3.0;

/// z-value scaling the standard error into a two-sided 95% interval.
pub const Z_95: f64 = 1.96;
