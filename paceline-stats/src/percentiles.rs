//! Percentile computation over sorted samples.

/// Compute a percentile (0–100) of an ascending-sorted slice using linear
/// interpolation between the nearest ranks.
///
/// Callers sort once and query many times; passing an unsorted slice yields
/// meaningless results. Returns 0.0 for an empty slice.
pub fn percentile_of_sorted(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let clamped = percentile.clamp(0.0, 100.0);
    let rank = (clamped / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        return sorted[lower];
    }

    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(percentile_of_sorted(&[], 50.0), 0.0);
    }

    #[test]
    fn test_single_element() {
        assert_eq!(percentile_of_sorted(&[42.0], 99.0), 42.0);
    }

    #[test]
    fn test_median_odd() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_of_sorted(&sorted, 50.0), 3.0);
    }

    #[test]
    fn test_interpolation() {
        let sorted = [10.0, 20.0];
        // Rank 0.5 sits halfway between the two elements.
        assert_eq!(percentile_of_sorted(&sorted, 50.0), 15.0);
        assert_eq!(percentile_of_sorted(&sorted, 25.0), 12.5);
    }

    #[test]
    fn test_extremes() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_of_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_of_sorted(&sorted, 100.0), 4.0);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let sorted = [1.0, 2.0, 3.0];
        assert_eq!(percentile_of_sorted(&sorted, -10.0), 1.0);
        assert_eq!(percentile_of_sorted(&sorted, 150.0), 3.0);
    }
}
