//! Outlier detection.
//!
//! Samples are flagged as outliers when they fall outside a symmetric band
//! around the median, `[median - k*IQR, median + k*IQR]`. Centering on the
//! median instead of the quartiles keeps the band tied to the same statistic
//! the summary reports as its central tendency. Outliers are counted, never
//! removed: tail latencies are still signal.

use crate::percentiles::percentile_of_sorted;

/// The inclusive band outside which a sample counts as an outlier.
pub fn outlier_bounds(sorted: &[f64], k: f64) -> (f64, f64) {
    let median = percentile_of_sorted(sorted, 50.0);
    let q1 = percentile_of_sorted(sorted, 25.0);
    let q3 = percentile_of_sorted(sorted, 75.0);
    let iqr = q3 - q1;
    (median - k * iqr, median + k * iqr)
}

/// Count samples outside the `median ± k*IQR` band.
///
/// Expects an ascending-sorted slice, like everything else in this crate.
pub fn count_outliers(sorted: &[f64], k: f64) -> usize {
    if sorted.len() < 2 {
        return 0;
    }
    let (lower, upper) = outlier_bounds(sorted, k);
    sorted.iter().filter(|&&x| x < lower || x > upper).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_samples_have_no_outliers() {
        let sorted = [100.0, 100.0, 100.0, 100.0, 100.0];
        assert_eq!(count_outliers(&sorted, 3.0), 0);
    }

    #[test]
    fn test_extreme_spike_is_flagged() {
        let mut samples: Vec<f64> = (0..50).map(|i| 100.0 + i as f64 * 0.1).collect();
        samples.push(10_000.0);
        samples.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(count_outliers(&samples, 3.0), 1);
    }

    #[test]
    fn test_bimodal_within_band() {
        // Two tight clusters: IQR spans the clusters, so neither is outside
        // a k=3 band around the midpoint median.
        let mut samples = Vec::new();
        samples.extend(std::iter::repeat(10.0).take(50));
        samples.extend(std::iter::repeat(12.0).take(50));
        assert_eq!(count_outliers(&samples, 3.0), 0);
    }

    #[test]
    fn test_tiny_inputs() {
        assert_eq!(count_outliers(&[], 3.0), 0);
        assert_eq!(count_outliers(&[5.0], 3.0), 0);
    }

    #[test]
    fn test_bounds_are_symmetric_about_median() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (lower, upper) = outlier_bounds(&sorted, 2.0);
        let median = 3.0;
        assert_eq!(median - lower, upper - median);
    }
}
