use std::ops::Range;

use serde::Serialize;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides the data range into equal-width bins and counts the
/// frequency of values falling into each bin. Non-finite values are not
/// binned; they are counted in [`Histogram::non_finite`].
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    /// The bins comprising the histogram, in ascending order.
    pub bins: Vec<HistogramBin>,
    /// Number of `NaN` or infinite values that were skipped.
    pub non_finite: u64,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    ///
    /// The last bin also includes its end value.
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram with `num_bins` equal-width bins.
    ///
    /// # Arguments
    ///
    /// * `values` - The data points to create the histogram from.
    /// * `num_bins` - The number of bins to create.
    /// * `explicit_min` - If provided, overrides the lower histogram bound.
    /// * `explicit_max` - If provided, overrides the upper histogram bound.
    ///
    /// Values outside explicit bounds are clamped into the first or last bin.
    ///
    /// # Examples
    ///
    /// ```
    /// # use botortop_stats::histogram::Histogram;
    /// let values = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 10.0];
    /// let histogram = Histogram::new(values, 5, None, None);
    /// assert_eq!(histogram.bins.len(), 5);
    /// assert_eq!(histogram.bins.iter().map(|b| b.count).sum::<u64>(), 10);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn new<I>(
        values: I,
        num_bins: usize,
        explicit_min: Option<f64>,
        explicit_max: Option<f64>,
    ) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (finite, non_finite): (Vec<f64>, Vec<f64>) =
            values.into_iter().partition(|v| v.is_finite());
        let non_finite = non_finite.len() as u64;

        if finite.is_empty() || num_bins == 0 {
            return Self {
                bins: vec![],
                non_finite,
            };
        }

        let min =
            explicit_min.unwrap_or_else(|| finite.iter().copied().fold(f64::INFINITY, f64::min));
        let max = explicit_max
            .unwrap_or_else(|| finite.iter().copied().fold(f64::NEG_INFINITY, f64::max));

        // Edge case: distribution is concentrated at a single value
        let mut width = (max - min) / num_bins as f64;
        if width <= 0.0 || !width.is_finite() {
            width = 1.0;
        }

        let mut bins = (0..num_bins)
            .map(|i| HistogramBin {
                // Recompute boundaries from the index to avoid accumulation errors
                range: (min + i as f64 * width)..(min + (i + 1) as f64 * width),
                count: 0,
            })
            .collect::<Vec<_>>();

        for val in finite {
            let pos = ((val - min) / width).floor();
            let idx = if pos < 0.0 {
                0
            } else {
                (pos as usize).min(num_bins - 1)
            };
            bins[idx].count += 1;
        }

        Self { bins, non_finite }
    }
}
