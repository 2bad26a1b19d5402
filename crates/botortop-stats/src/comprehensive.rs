use serde::Serialize;

use crate::{descriptive::DescriptiveStats, histogram::Histogram, percentiles::Percentiles};

/// Percentile points reported by [`ComprehensiveStats::with_default_percentiles`].
pub const DEFAULT_PERCENTILES: [f64; 9] = [1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0];

/// Summary, percentiles and histogram of one series, as exported for plotting.
///
/// # Examples
///
/// ```
/// use botortop_stats::comprehensive::ComprehensiveStats;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let stats = ComprehensiveStats::new(
///     values,
///     &[25.0, 50.0, 75.0], // Percentiles to compute
///     5,                   // Number of histogram bins
/// )
/// .unwrap();
///
/// assert_eq!(stats.stats.mean, 5.5);
/// assert_eq!(stats.percentiles.get(50.0), Some(6.0));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveStats {
    pub stats: DescriptiveStats,
    pub percentiles: Percentiles,
    /// Spans the observed range of the values
    pub histogram: Histogram,
}

impl ComprehensiveStats {
    /// Sorts `values` once and derives every summary from the sorted copy.
    ///
    /// Returns `None` for an empty series.
    #[must_use]
    pub fn new<I>(values: I, percentile_points: &[f64], hist_num_bins: usize) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);

        let stats = DescriptiveStats::from_sorted(&sorted)?;
        let percentiles = Percentiles::from_sorted(&sorted, percentile_points);
        let histogram = Histogram::new(sorted, hist_num_bins, None, None);

        Some(Self {
            stats,
            percentiles,
            histogram,
        })
    }

    /// Like [`Self::new`], reporting [`DEFAULT_PERCENTILES`].
    #[must_use]
    pub fn with_default_percentiles<I>(values: I, hist_num_bins: usize) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(values, &DEFAULT_PERCENTILES, hist_num_bins)
    }
}
