//! Summary statistics over retained duration samples.
//!
//! The summary deliberately mixes robust and raw views: the median and
//! trimmed mean resist long-tail scheduler/GC spikes, the minimum reports the
//! fastest observed run untouched, and the outlier count says how much tail
//! there was without removing it.

use serde::{Deserialize, Serialize};

use crate::outliers::count_outliers;
use crate::{DEFAULT_OUTLIER_K, DEFAULT_TRIM_FRACTION, Z_95};

/// Policy knobs for [`summarize_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Fraction of samples dropped from each tail before averaging.
    pub trim_fraction: f64,
    /// IQR multiplier for the outlier band around the median.
    pub outlier_k: f64,
    /// z-value scaling the standard error into the confidence interval.
    pub z_value: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            trim_fraction: DEFAULT_TRIM_FRACTION,
            outlier_k: DEFAULT_OUTLIER_K,
            z_value: Z_95,
        }
    }
}

/// Derived statistics for one run; a pure function of the retained samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of retained samples the summary was computed from.
    pub sample_count: usize,
    /// Middle element, or the mean of the two middle elements.
    pub median_ns: f64,
    /// Fastest retained sample.
    pub min_ns: f64,
    /// Mean after dropping the trimmed fraction from each tail.
    pub trimmed_mean_ns: f64,
    /// Standard error of the trimmed set.
    pub std_error_ns: f64,
    /// Lower confidence bound around the trimmed mean.
    pub ci_lower_ns: f64,
    /// Upper confidence bound around the trimmed mean.
    pub ci_upper_ns: f64,
    /// Samples outside the `median ± k*IQR` band (counted, not removed).
    pub outlier_count: usize,
}

/// Summarize retained durations with the default policy
/// (10% trim, k = 3, 95% interval).
pub fn summarize(durations_ns: &[u64]) -> SummaryStatistics {
    summarize_with(durations_ns, &SummaryOptions::default())
}

/// Summarize retained durations.
///
/// Deterministic and order-independent: the input is sorted into a copy, and
/// every subsequent operation runs in that fixed order, so permuting the
/// input cannot change a single output bit.
pub fn summarize_with(durations_ns: &[u64], options: &SummaryOptions) -> SummaryStatistics {
    if durations_ns.is_empty() {
        return SummaryStatistics {
            sample_count: 0,
            median_ns: 0.0,
            min_ns: 0.0,
            trimmed_mean_ns: 0.0,
            std_error_ns: 0.0,
            ci_lower_ns: 0.0,
            ci_upper_ns: 0.0,
            outlier_count: 0,
        };
    }

    // Sorting the integer durations gives a total order with no NaN edge
    // cases; the float view is derived afterwards.
    let mut sorted_ns = durations_ns.to_vec();
    sorted_ns.sort_unstable();
    let sorted: Vec<f64> = sorted_ns.iter().map(|&ns| ns as f64).collect();
    let n = sorted.len();

    let median_ns = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let min_ns = sorted[0];

    // Trim an equal count from both tails, but never trim away everything.
    let trim_count = (n as f64 * options.trim_fraction).floor() as usize;
    let trimmed = if n > 2 * trim_count {
        &sorted[trim_count..n - trim_count]
    } else {
        &sorted[..]
    };

    let trimmed_mean_ns = trimmed.iter().sum::<f64>() / trimmed.len() as f64;

    let std_error_ns = if trimmed.len() < 2 {
        0.0
    } else {
        let variance = trimmed
            .iter()
            .map(|x| {
                let d = x - trimmed_mean_ns;
                d * d
            })
            .sum::<f64>()
            / (trimmed.len() - 1) as f64;
        variance.sqrt() / (trimmed.len() as f64).sqrt()
    };

    let half_width = options.z_value * std_error_ns;

    SummaryStatistics {
        sample_count: n,
        median_ns,
        min_ns,
        trimmed_mean_ns,
        std_error_ns,
        ci_lower_ns: trimmed_mean_ns - half_width,
        ci_upper_ns: trimmed_mean_ns + half_width,
        outlier_count: count_outliers(&sorted, options.outlier_k),
    }
}
