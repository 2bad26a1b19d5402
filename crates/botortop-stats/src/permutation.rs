//! Permutation (randomization) tests for two-group comparisons.
//!
//! A permutation test estimates how surprising an observed statistic is under
//! the null hypothesis that group labels are exchangeable. The observations of
//! both groups are pooled, the pool is shuffled, re-split into groups of the
//! original sizes, and the statistic is recomputed. The resulting null
//! distribution is compared against the observed value.
//!
//! # Partition strategies
//!
//! Both strategies shuffle the pooled values; they differ in how the shuffled
//! values are re-split:
//!
//! - [`Partition::Slice`]: the first `len_a` shuffled values form group A, the
//!   rest form group B. Used for two pre-partitioned samples.
//! - [`Partition::Mask`]: a fixed boolean mask assigns shuffled values to
//!   group A (`true`) or B (`false`). Used when testing whether a column's
//!   missingness pattern depends on another column.
//!
//! # Reproducibility
//!
//! The random generator is always supplied by the caller. Seeding the same
//! generator type with the same seed reproduces the null distribution and
//! p-value bit for bit.
//!
//! # Examples
//!
//! ```
//! use botortop_stats::permutation::{DiffMeans, PermutationTest};
//! use rand::{SeedableRng as _, rngs::StdRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let test = PermutationTest::new(DiffMeans, 1000);
//! let result = test.run(&[1.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 0.0, 0.0], &mut rng)?;
//!
//! assert_eq!(result.observed(), 0.75);
//! assert_eq!(result.null_distribution().len(), 1000);
//! assert!((0.0..=1.0).contains(&result.p_value()));
//! # Ok::<(), botortop_stats::permutation::PermutationTestError>(())
//! ```

use rand::{Rng, seq::SliceRandom as _};
use serde::Serialize;

use crate::descriptive;

/// Largest pooled sample size accepted by [`PermutationTest::run_exact`].
pub const MAX_EXACT_POOLED_LEN: usize = 24;

/// Relative tolerance used when comparing null statistics with the observed one.
///
/// Statistics computed from the same multiset of values in a different order
/// may differ in the last bits; such ties count as "at least as extreme".
const TIE_TOLERANCE: f64 = 1e-12;

/// Error returned by a [`TestStatistic`] that cannot be evaluated.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("{message}")]
pub struct StatisticError {
    message: String,
}

impl StatisticError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
pub enum PermutationTestError {
    #[display("sample {group} is empty")]
    EmptySample { group: &'static str },
    #[display("number of permutations must be positive")]
    ZeroPermutations,
    #[display("mask has {mask_len} entries but there are {values_len} values")]
    MaskLengthMismatch { mask_len: usize, values_len: usize },
    #[display("mask must assign at least one value to each group")]
    DegenerateMask,
    #[display("exact enumeration supports at most {max} pooled values, got {len}")]
    SampleTooLarge { len: usize, max: usize },
    #[display("statistic could not be evaluated: {_0}")]
    Statistic(StatisticError),
}

/// A statistic comparing two samples.
///
/// Implemented for every `Fn(&[f64], &[f64]) -> f64` closure, so simple
/// statistics can be passed inline. Implement the trait directly for
/// statistics that can reject their input.
pub trait TestStatistic {
    /// Evaluates the statistic on group A and group B.
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<f64, StatisticError>;
}

impl<F> TestStatistic for F
where
    F: Fn(&[f64], &[f64]) -> f64,
{
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<f64, StatisticError> {
        Ok(self(a, b))
    }
}

/// Difference of means, `mean(a) - mean(b)`.
///
/// For {0, 1} indicators this is the difference in proportions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffMeans;

impl TestStatistic for DiffMeans {
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<f64, StatisticError> {
        Ok(descriptive::mean(a) - descriptive::mean(b))
    }
}

/// Difference of medians, `median(a) - median(b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffMedians;

impl TestStatistic for DiffMedians {
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<f64, StatisticError> {
        Ok(descriptive::median(a) - descriptive::median(b))
    }
}

/// Absolute difference of means, `|mean(a) - mean(b)|`.
///
/// Non-negative, so it should be paired with [`Alternative::Greater`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsDiffMeans;

impl TestStatistic for AbsDiffMeans {
    fn evaluate(&self, a: &[f64], b: &[f64]) -> Result<f64, StatisticError> {
        Ok((descriptive::mean(a) - descriptive::mean(b)).abs())
    }
}

/// Which tail(s) of the null distribution count as "at least as extreme".
///
/// `TwoSided` compares absolute values and therefore assumes a signed statistic
/// centred on zero under the null (such as [`DiffMeans`]). Statistics that are
/// not symmetric under a group-label swap (ratios, absolute differences) must
/// use a one-sided alternative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alternative {
    /// `|null| >= |observed|`
    #[default]
    TwoSided,
    /// `null >= observed`
    Greater,
    /// `null <= observed`
    Less,
}

impl Alternative {
    fn is_at_least_as_extreme(self, null: f64, observed: f64) -> bool {
        let tol = TIE_TOLERANCE * observed.abs().max(1.0);
        match self {
            Self::TwoSided => null.abs() >= observed.abs() - tol,
            Self::Greater => null >= observed - tol,
            Self::Less => null <= observed + tol,
        }
    }

    /// Fraction of finite `null` values at least as extreme as `observed`.
    ///
    /// Returns the p-value (NaN when inconclusive) and the number of
    /// non-finite null values that were left out.
    #[expect(clippy::cast_precision_loss)]
    fn p_value(self, observed: f64, null: &[f64]) -> (f64, usize) {
        let mut finite = 0_usize;
        let mut extreme = 0_usize;
        for &value in null {
            if !value.is_finite() {
                continue;
            }
            finite += 1;
            if self.is_at_least_as_extreme(value, observed) {
                extreme += 1;
            }
        }
        let non_finite = null.len() - finite;
        if !observed.is_finite() || finite == 0 {
            return (f64::NAN, non_finite);
        }
        (extreme as f64 / finite as f64, non_finite)
    }
}

/// How shuffled pooled values are re-split into two groups.
#[derive(Debug, Clone, Copy)]
pub enum Partition<'a> {
    /// The first `len_a` values form group A, the remainder group B.
    Slice { len_a: usize },
    /// Values at `true` positions form group A, the others group B.
    Mask(&'a [bool]),
}

impl Partition<'_> {
    fn validate(&self, values_len: usize) -> Result<(), PermutationTestError> {
        match *self {
            Partition::Slice { len_a } => {
                if len_a == 0 {
                    return Err(PermutationTestError::EmptySample { group: "A" });
                }
                if len_a >= values_len {
                    return Err(PermutationTestError::EmptySample { group: "B" });
                }
            }
            Partition::Mask(mask) => {
                if mask.len() != values_len {
                    return Err(PermutationTestError::MaskLengthMismatch {
                        mask_len: mask.len(),
                        values_len,
                    });
                }
                if mask.iter().all(|&m| m) || mask.iter().all(|&m| !m) {
                    return Err(PermutationTestError::DegenerateMask);
                }
            }
        }
        Ok(())
    }

    /// Splits `values` into the two groups, reusing the buffers for the mask case.
    fn split<'v>(
        &self,
        values: &'v [f64],
        buf_a: &'v mut Vec<f64>,
        buf_b: &'v mut Vec<f64>,
    ) -> (&'v [f64], &'v [f64]) {
        match *self {
            Partition::Slice { len_a } => values.split_at(len_a),
            Partition::Mask(mask) => {
                buf_a.clear();
                buf_b.clear();
                for (&value, &in_a) in values.iter().zip(mask) {
                    if in_a {
                        buf_a.push(value);
                    } else {
                        buf_b.push(value);
                    }
                }
                (buf_a.as_slice(), buf_b.as_slice())
            }
        }
    }
}

/// Outcome of a Monte Carlo permutation test.
///
/// Created per invocation and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    observed: f64,
    p_value: f64,
    alternative: Alternative,
    null_distribution: Vec<f64>,
    non_finite_count: usize,
}

impl TestResult {
    /// The statistic evaluated on the observed (unpermuted) groups.
    #[must_use]
    pub fn observed(&self) -> f64 {
        self.observed
    }

    /// Estimated p-value in `[0, 1]`, or NaN when the test is inconclusive.
    #[must_use]
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    #[must_use]
    pub fn alternative(&self) -> Alternative {
        self.alternative
    }

    /// The statistic evaluated on every permutation, in draw order.
    ///
    /// Always has exactly as many entries as permutations were requested,
    /// including any non-finite values.
    #[must_use]
    pub fn null_distribution(&self) -> &[f64] {
        &self.null_distribution
    }

    /// Number of null values that were NaN or infinite and therefore ignored
    /// when computing the p-value.
    #[must_use]
    pub fn non_finite_count(&self) -> usize {
        self.non_finite_count
    }

    /// Whether the p-value could not be computed.
    #[must_use]
    pub fn is_inconclusive(&self) -> bool {
        self.p_value.is_nan()
    }

    /// Whether the p-value is below `alpha`. Inconclusive results are never significant.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Outcome of an exact permutation test over every possible split.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExactTestResult {
    /// The statistic evaluated on the observed groups.
    pub observed: f64,
    /// Exact p-value over all splits.
    pub p_value: f64,
    /// Number of splits enumerated, `C(n_a + n_b, n_a)`.
    pub num_splits: u64,
    /// Number of splits whose statistic was NaN or infinite.
    pub non_finite_count: usize,
}

/// A configured permutation test.
///
/// Holds the statistic, the number of permutations, and the tail rule. The
/// same configuration can be run on many inputs.
#[derive(Debug, Clone)]
pub struct PermutationTest<S> {
    statistic: S,
    n_permutations: usize,
    alternative: Alternative,
}

impl<S> PermutationTest<S>
where
    S: TestStatistic,
{
    /// Creates a two-sided test drawing `n_permutations` random relabelings.
    #[must_use]
    pub fn new(statistic: S, n_permutations: usize) -> Self {
        Self {
            statistic,
            n_permutations,
            alternative: Alternative::TwoSided,
        }
    }

    /// Sets the tail rule used for the p-value.
    #[must_use]
    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    #[must_use]
    pub fn n_permutations(&self) -> usize {
        self.n_permutations
    }

    /// Tests two pre-partitioned samples ([`Partition::Slice`]).
    pub fn run<R>(
        &self,
        sample_a: &[f64],
        sample_b: &[f64],
        rng: &mut R,
    ) -> Result<TestResult, PermutationTestError>
    where
        R: Rng + ?Sized,
    {
        if sample_a.is_empty() {
            return Err(PermutationTestError::EmptySample { group: "A" });
        }
        if sample_b.is_empty() {
            return Err(PermutationTestError::EmptySample { group: "B" });
        }
        let pooled = [sample_a, sample_b].concat();
        self.run_partitioned(
            pooled,
            Partition::Slice {
                len_a: sample_a.len(),
            },
            rng,
        )
    }

    /// Tests one column split by a fixed boolean mask ([`Partition::Mask`]).
    ///
    /// Values at `true` mask positions form group A. Every permutation shuffles
    /// the values and re-splits them with the same mask, so group sizes match
    /// the observed split.
    ///
    /// ```
    /// use botortop_stats::permutation::{AbsDiffMeans, Alternative, PermutationTest};
    /// use rand::{SeedableRng as _, rngs::StdRng};
    ///
    /// let values = [30.0, 31.0, 29.0, 45.0, 44.0, 46.0];
    /// let is_missing = [false, false, false, true, true, true];
    ///
    /// let test = PermutationTest::new(AbsDiffMeans, 200).with_alternative(Alternative::Greater);
    /// let result = test.run_masked(&values, &is_missing, &mut StdRng::seed_from_u64(0))?;
    /// assert_eq!(result.observed(), 15.0);
    /// # Ok::<(), botortop_stats::permutation::PermutationTestError>(())
    /// ```
    pub fn run_masked<R>(
        &self,
        values: &[f64],
        mask: &[bool],
        rng: &mut R,
    ) -> Result<TestResult, PermutationTestError>
    where
        R: Rng + ?Sized,
    {
        self.run_partitioned(values.to_vec(), Partition::Mask(mask), rng)
    }

    /// Runs the test on `values` split by `partition`.
    ///
    /// The observed statistic is computed on the unshuffled split; the values
    /// are then shuffled in place `n_permutations` times.
    pub fn run_partitioned<R>(
        &self,
        mut values: Vec<f64>,
        partition: Partition<'_>,
        rng: &mut R,
    ) -> Result<TestResult, PermutationTestError>
    where
        R: Rng + ?Sized,
    {
        if self.n_permutations == 0 {
            return Err(PermutationTestError::ZeroPermutations);
        }
        partition.validate(values.len())?;

        let mut buf_a = Vec::with_capacity(values.len());
        let mut buf_b = Vec::with_capacity(values.len());

        let observed = {
            let (a, b) = partition.split(&values, &mut buf_a, &mut buf_b);
            self.statistic
                .evaluate(a, b)
                .map_err(PermutationTestError::Statistic)?
        };

        tracing::debug!(
            n_values = values.len(),
            n_permutations = self.n_permutations,
            observed,
            "running permutation test"
        );

        let mut null_distribution = Vec::with_capacity(self.n_permutations);
        for _ in 0..self.n_permutations {
            values.shuffle(rng);
            let (a, b) = partition.split(&values, &mut buf_a, &mut buf_b);
            let stat = self
                .statistic
                .evaluate(a, b)
                .map_err(PermutationTestError::Statistic)?;
            null_distribution.push(stat);
        }

        let (p_value, non_finite_count) = self.alternative.p_value(observed, &null_distribution);
        if non_finite_count > 0 {
            tracing::warn!(
                non_finite_count,
                n_permutations = self.n_permutations,
                "statistic was not finite for some permutations; they are excluded from the p-value"
            );
        }
        if p_value.is_nan() {
            tracing::warn!(observed, "permutation test is inconclusive");
        }

        Ok(TestResult {
            observed,
            p_value,
            alternative: self.alternative,
            null_distribution,
            non_finite_count,
        })
    }

    /// Computes the exact p-value by enumerating every split of the pooled
    /// samples into groups of the observed sizes.
    ///
    /// Only feasible for small samples; the pooled length is limited to
    /// [`MAX_EXACT_POOLED_LEN`].
    ///
    /// ```
    /// use botortop_stats::permutation::{DiffMeans, PermutationTest};
    ///
    /// let test = PermutationTest::new(DiffMeans, 1);
    /// let exact = test.run_exact(&[1.0, 1.0, 1.0, 0.0], &[0.0, 0.0, 0.0, 0.0])?;
    /// assert_eq!(exact.num_splits, 70);
    /// assert!((exact.p_value - 10.0 / 70.0).abs() < 1e-12);
    /// # Ok::<(), botortop_stats::permutation::PermutationTestError>(())
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn run_exact(
        &self,
        sample_a: &[f64],
        sample_b: &[f64],
    ) -> Result<ExactTestResult, PermutationTestError> {
        if sample_a.is_empty() {
            return Err(PermutationTestError::EmptySample { group: "A" });
        }
        if sample_b.is_empty() {
            return Err(PermutationTestError::EmptySample { group: "B" });
        }
        let pooled = [sample_a, sample_b].concat();
        if pooled.len() > MAX_EXACT_POOLED_LEN {
            return Err(PermutationTestError::SampleTooLarge {
                len: pooled.len(),
                max: MAX_EXACT_POOLED_LEN,
            });
        }

        let observed = self
            .statistic
            .evaluate(sample_a, sample_b)
            .map_err(PermutationTestError::Statistic)?;

        let len_a = sample_a.len();
        let mut in_a = vec![false; pooled.len()];
        let mut buf_a = Vec::with_capacity(pooled.len());
        let mut buf_b = Vec::with_capacity(pooled.len());
        let mut num_splits = 0_u64;
        let mut finite = 0_u64;
        let mut extreme = 0_u64;
        let mut non_finite_count = 0_usize;

        let mut combinations = Combinations::new(pooled.len(), len_a);
        while let Some(combination) = combinations.next_combination() {
            in_a.fill(false);
            for &i in combination {
                in_a[i] = true;
            }
            let (a, b) = Partition::Mask(&in_a).split(&pooled, &mut buf_a, &mut buf_b);
            let stat = self
                .statistic
                .evaluate(a, b)
                .map_err(PermutationTestError::Statistic)?;
            num_splits += 1;
            if stat.is_finite() {
                finite += 1;
                if self.alternative.is_at_least_as_extreme(stat, observed) {
                    extreme += 1;
                }
            } else {
                non_finite_count += 1;
            }
        }

        let p_value = if observed.is_finite() && finite > 0 {
            extreme as f64 / finite as f64
        } else {
            f64::NAN
        };

        Ok(ExactTestResult {
            observed,
            p_value,
            num_splits,
            non_finite_count,
        })
    }
}

/// Lexicographic enumeration of `k`-element index subsets of `0..n`.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    /// Advances to the next combination and borrows it.
    fn next_combination(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if self.started {
            let k = self.indices.len();
            // Rightmost index that can still move right
            let Some(i) = (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) else {
                self.done = true;
                return None;
            };
            self.indices[i] += 1;
            for j in i + 1..k {
                self.indices[j] = self.indices[j - 1] + 1;
            }
        }
        self.started = true;
        Some(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg32;

    use super::*;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn test_empty_samples_rejected() {
        let test = PermutationTest::new(DiffMeans, 10);
        assert!(matches!(
            test.run(&[], &[1.0], &mut rng(0)),
            Err(PermutationTestError::EmptySample { group: "A" })
        ));
        assert!(matches!(
            test.run(&[1.0], &[], &mut rng(0)),
            Err(PermutationTestError::EmptySample { group: "B" })
        ));
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let test = PermutationTest::new(DiffMeans, 0);
        assert!(matches!(
            test.run(&[1.0], &[0.0], &mut rng(0)),
            Err(PermutationTestError::ZeroPermutations)
        ));
    }

    #[test]
    fn test_failing_statistic_rejected_before_resampling() {
        struct Rejecting;
        impl TestStatistic for Rejecting {
            fn evaluate(&self, _a: &[f64], _b: &[f64]) -> Result<f64, StatisticError> {
                Err(StatisticError::new("unsupported input"))
            }
        }
        let test = PermutationTest::new(Rejecting, 10);
        let err = test.run(&[1.0], &[2.0], &mut rng(0)).unwrap_err();
        assert!(matches!(err, PermutationTestError::Statistic(_)));
        assert!(err.to_string().contains("unsupported input"));
    }

    #[test]
    fn test_null_length_and_bounds() {
        let test = PermutationTest::new(DiffMeans, 500);
        let result = test
            .run(&[1.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 0.0], &mut rng(1))
            .unwrap();
        assert_eq!(result.null_distribution().len(), 500);
        assert!((0.0..=1.0).contains(&result.p_value()));
        assert_eq!(result.non_finite_count(), 0);
        assert_eq!(result.alternative(), Alternative::TwoSided);
    }

    #[test]
    fn test_single_permutation() {
        let test = PermutationTest::new(DiffMeans, 1);
        for seed in 0..10 {
            let result = test
                .run(&[1.0, 2.0, 3.0], &[4.0, 5.0], &mut rng(seed))
                .unwrap();
            assert_eq!(result.null_distribution().len(), 1);
            assert!(result.p_value() == 0.0 || result.p_value() == 1.0);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let test = PermutationTest::new(DiffMeans, 2000);
        let a = [0.3, 1.2, 2.2, 0.1, 0.9];
        let b = [1.5, 2.5, 0.4, 3.1];
        let r1 = test.run(&a, &b, &mut rng(7)).unwrap();
        let r2 = test.run(&a, &b, &mut rng(7)).unwrap();
        assert_eq!(
            r1.null_distribution()
                .iter()
                .map(|v| v.to_bits())
                .collect::<Vec<_>>(),
            r2.null_distribution()
                .iter()
                .map(|v| v.to_bits())
                .collect::<Vec<_>>()
        );
        assert_eq!(r1.p_value().to_bits(), r2.p_value().to_bits());
    }

    #[test]
    fn test_identical_groups_not_significant() {
        let test = PermutationTest::new(DiffMeans, 1000);
        for seed in 0..5 {
            let result = test
                .run(&[1.0, 1.0, 0.0, 0.0], &[1.0, 1.0, 0.0, 0.0], &mut rng(seed))
                .unwrap();
            assert_eq!(result.observed(), 0.0);
            assert_eq!(result.p_value(), 1.0);
        }
    }

    #[test]
    fn test_same_distribution_rarely_significant() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let test = PermutationTest::new(DiffMeans, 500);
        let mut significant = 0;
        for seed in 0..20 {
            let mut r = rng(seed);
            let a = (0..30).map(|_| normal.sample(&mut r)).collect::<Vec<f64>>();
            let b = (0..30).map(|_| normal.sample(&mut r)).collect::<Vec<f64>>();
            let result = test.run(&a, &b, &mut r).unwrap();
            if result.is_significant(0.05) {
                significant += 1;
            }
        }
        assert!(significant < 6, "{significant} of 20 runs significant");
    }

    #[test]
    fn test_shifted_distribution_detected() {
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut r = rng(3);
        let a = (0..40).map(|_| normal.sample(&mut r) + 2.0).collect::<Vec<f64>>();
        let b = (0..40).map(|_| normal.sample(&mut r)).collect::<Vec<f64>>();
        let result = PermutationTest::new(DiffMeans, 1000)
            .run(&a, &b, &mut r)
            .unwrap();
        assert!(result.p_value() < 0.01);
    }

    #[test]
    fn test_monte_carlo_matches_exact() {
        let a = [1.0, 1.0, 1.0, 0.0];
        let b = [0.0, 0.0, 0.0, 0.0];
        let test = PermutationTest::new(DiffMeans, 10_000);
        let exact = test.run_exact(&a, &b).unwrap();
        assert_eq!(exact.num_splits, 70);
        assert!((exact.p_value - 1.0 / 7.0).abs() < 1e-12);

        let estimate = test.run(&a, &b, &mut rng(11)).unwrap();
        assert_eq!(estimate.observed(), 0.75);
        assert!((estimate.p_value() - exact.p_value).abs() < 0.05);
    }

    #[test]
    fn test_swapping_groups_with_negated_statistic() {
        let a = [2.1, 3.4, 1.9, 4.0, 2.8];
        let b = [1.0, 0.4, 2.2, 1.7];
        let forward = PermutationTest::new(DiffMeans, 1).run_exact(&a, &b).unwrap();
        let swapped = PermutationTest::new(
            |x: &[f64], y: &[f64]| descriptive::mean(y) - descriptive::mean(x),
            1,
        )
        .run_exact(&b, &a)
        .unwrap();
        assert!((forward.observed - swapped.observed).abs() < 1e-12);
        assert!((forward.p_value - swapped.p_value).abs() < 1e-12);

        let mc_forward = PermutationTest::new(DiffMeans, 5000)
            .run(&a, &b, &mut rng(5))
            .unwrap();
        assert!((mc_forward.p_value() - forward.p_value).abs() < 0.05);
    }

    #[test]
    fn test_exact_too_large() {
        let a = vec![0.0; 20];
        let b = vec![1.0; 5];
        assert!(matches!(
            PermutationTest::new(DiffMeans, 1).run_exact(&a, &b),
            Err(PermutationTestError::SampleTooLarge { len: 25, .. })
        ));
    }

    #[test]
    fn test_mask_preserves_group_sizes() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mask = [true, false, false, true, false, false, false];
        let statistic = |a: &[f64], b: &[f64]| {
            assert_eq!(a.len(), 2);
            assert_eq!(b.len(), 5);
            descriptive::mean(a) - descriptive::mean(b)
        };
        let result = PermutationTest::new(statistic, 300)
            .run_masked(&values, &mask, &mut rng(2))
            .unwrap();
        assert_eq!(result.observed(), 2.5 - 5.0);
        assert_eq!(result.null_distribution().len(), 300);
    }

    #[test]
    fn test_mask_validation() {
        let test = PermutationTest::new(AbsDiffMeans, 10);
        assert!(matches!(
            test.run_masked(&[1.0, 2.0], &[true], &mut rng(0)),
            Err(PermutationTestError::MaskLengthMismatch {
                mask_len: 1,
                values_len: 2
            })
        ));
        assert!(matches!(
            test.run_masked(&[1.0, 2.0], &[true, true], &mut rng(0)),
            Err(PermutationTestError::DegenerateMask)
        ));
        assert!(matches!(
            test.run_masked(&[1.0, 2.0], &[false, false], &mut rng(0)),
            Err(PermutationTestError::DegenerateMask)
        ));
    }

    #[test]
    fn test_greater_alternative_with_absolute_statistic() {
        let values = [10.0, 11.0, 9.0, 10.5, 30.0, 31.0, 29.0, 30.5];
        let mask = [false, false, false, false, true, true, true, true];
        let result = PermutationTest::new(AbsDiffMeans, 2000)
            .with_alternative(Alternative::Greater)
            .run_masked(&values, &mask, &mut rng(9))
            .unwrap();
        assert!(result.null_distribution().iter().all(|&v| v >= 0.0));
        // Only the observed split and its mirror reach the observed value: 2 of 70
        assert!(result.p_value() < 0.1);
    }

    #[test]
    fn test_non_finite_values_are_filtered() {
        // NaN whenever group A holds the zero
        let ratio = |a: &[f64], b: &[f64]| {
            if a.contains(&0.0) {
                f64::NAN
            } else {
                descriptive::mean(a) - descriptive::mean(b)
            }
        };
        let result = PermutationTest::new(ratio, 400)
            .run(&[1.0, 2.0], &[0.0, 3.0, 4.0], &mut rng(4))
            .unwrap();
        assert_eq!(result.null_distribution().len(), 400);
        assert!(result.non_finite_count() > 0);
        assert!(result.non_finite_count() < 400);
        assert!((0.0..=1.0).contains(&result.p_value()));
    }

    #[test]
    fn test_non_finite_observed_is_inconclusive() {
        let result = PermutationTest::new(|_: &[f64], _: &[f64]| f64::NAN, 10)
            .run(&[1.0], &[2.0], &mut rng(0))
            .unwrap();
        assert!(result.is_inconclusive());
        assert!(!result.is_significant(0.05));
        assert_eq!(result.non_finite_count(), 10);
    }

    #[test]
    fn test_diff_medians() {
        let result = PermutationTest::new(DiffMedians, 10)
            .run(&[1.0, 5.0, 3.0], &[2.0, 2.0], &mut rng(0))
            .unwrap();
        assert_eq!(result.observed(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_p_value_bounds_and_null_length(
            a in prop::collection::vec(-100.0_f64..100.0, 1..15),
            b in prop::collection::vec(-100.0_f64..100.0, 1..15),
            n_permutations in 1_usize..60,
            seed in any::<u64>(),
        ) {
            let result = PermutationTest::new(DiffMeans, n_permutations)
                .run(&a, &b, &mut rng(seed))
                .unwrap();
            prop_assert_eq!(result.null_distribution().len(), n_permutations);
            prop_assert!((0.0..=1.0).contains(&result.p_value()));
        }

        #[test]
        fn prop_mask_null_length(
            values in prop::collection::vec(-10.0_f64..10.0, 2..20),
            seed in any::<u64>(),
        ) {
            let mut mask = values.iter().map(|v| *v > 0.0).collect::<Vec<_>>();
            mask[0] = true;
            let last = mask.len() - 1;
            mask[last] = false;
            let result = PermutationTest::new(AbsDiffMeans, 25)
                .with_alternative(Alternative::Greater)
                .run_masked(&values, &mask, &mut rng(seed))
                .unwrap();
            prop_assert_eq!(result.null_distribution().len(), 25);
            prop_assert!((0.0..=1.0).contains(&result.p_value()));
        }
    }
}
