use serde::Serialize;

/// Nearest-rank percentiles of a series, serialized as `[percentile, value]`
/// pairs.
///
/// # Examples
///
/// ```
/// use botortop_stats::percentiles::Percentiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
///
/// assert_eq!(percentiles.get(50.0), Some(6.0));
/// assert_eq!(percentiles.get(25.0), Some(3.0));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Percentiles {
    /// `(percentile in 0..=100, value)`, in the order requested
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes percentiles from sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    /// Sorts a copy of `values` first.
    ///
    /// # Examples
    ///
    /// ```
    /// use botortop_stats::percentiles::Percentiles;
    ///
    /// let values = vec![5.0, 2.0, 8.0, 1.0, 9.0];
    /// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(5.0));
    /// ```
    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// `None` unless `percentile` was one of the requested points.
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values.iter().find_map(|(p, value)| {
            if (*p - percentile).abs() < f64::EPSILON {
                Some(*value)
            } else {
                None
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}

/// Nearest-rank percentile: the value at index `floor(n * k / 100)` of the
/// sorted data, or `NaN` for no data.
///
/// # Examples
///
/// ```
/// use botortop_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&values, 50.0), 3.0);
/// assert_eq!(compute_percentile(&values, 25.0), 2.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let idx = ((sorted_values.len() as f64 * percentile) / 100.0) as usize;
    let idx = idx.min(sorted_values.len() - 1);
    sorted_values[idx]
}

/// Computes a quantile (`q` in `[0, 1]`) from sorted data with linear
/// interpolation between the two closest ranks.
///
/// Returns `f64::NAN` if the input is empty.
///
/// ```
/// use botortop_stats::percentiles::compute_quantile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(compute_quantile(&values, 0.0), 1.0);
/// assert_eq!(compute_quantile(&values, 0.5), 2.5);
/// assert_eq!(compute_quantile(&values, 1.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_quantile(sorted_values: &[f64], q: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - pos.floor();
    sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac
}

/// Splits values into (up to) `num_bins` equal-frequency bins.
///
/// Bin edges are the linear-interpolated quantiles `0, 1/k, ..., 1`. Duplicate
/// edges are dropped, so heavily tied data yields fewer bins. The first bin is
/// closed on the left, every bin is closed on the right.
///
/// Returns one bin index per input value, in input order, or an empty vector
/// when `values` is empty.
///
/// ```
/// use botortop_stats::percentiles::quantile_bins;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
/// let bins = quantile_bins(&values, 4);
/// assert_eq!(bins, vec![0, 0, 1, 1, 2, 2, 3, 3]);
///
/// // Ties collapse edges
/// let bins = quantile_bins(&[0.0, 0.0, 0.0, 1.0], 4);
/// assert_eq!(bins, vec![0, 0, 0, 1]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn quantile_bins(values: &[f64], num_bins: usize) -> Vec<usize> {
    if values.is_empty() || num_bins == 0 {
        return vec![];
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut edges = (0..=num_bins)
        .map(|i| compute_quantile(&sorted, i as f64 / num_bins as f64))
        .collect::<Vec<_>>();
    edges.dedup_by(|a, b| (*a - *b).abs() <= f64::EPSILON * a.abs().max(1.0));

    values
        .iter()
        .map(|&v| {
            // Index of the first right edge >= v, minus one for the leading edge
            let pos = edges[1..].partition_point(|&edge| edge < v);
            pos.min(edges.len().saturating_sub(2))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_percentile() {
        let percentiles = Percentiles::new(&[1.0, 2.0, 3.0], &[50.0]);
        assert_eq!(percentiles.get(90.0), None);
        assert_eq!(percentiles.iter().count(), 1);
    }

    #[test]
    fn test_quantile_empty_is_nan() {
        assert!(compute_quantile(&[], 0.5).is_nan());
        assert!(compute_percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_quantile_bins_all_equal() {
        let bins = quantile_bins(&[3.0; 6], 10);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_quantile_bins_cover_range() {
        let values = (0..100).map(f64::from).collect::<Vec<_>>();
        let bins = quantile_bins(&values, 10);
        assert_eq!(bins.first(), Some(&0));
        assert_eq!(bins.last(), Some(&9));
        assert!(bins.is_sorted());
        for bin in 0..10 {
            assert_eq!(bins.iter().filter(|&&b| b == bin).count(), 10);
        }
    }
}
