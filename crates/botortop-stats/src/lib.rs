//! Statistical analysis utilities for the Bot-or-Top analysis.
//!
//! This crate provides a collection of statistical tools including:
//!
//! - **Descriptive statistics**: Calculate mean, median, variance, standard error, etc.
//! - **Percentiles**: Nearest-rank percentiles, interpolated quantiles and quantile binning
//! - **Histogram generation**: Equal-width frequency distributions
//! - **Comprehensive statistics**: Combined descriptive statistics, percentiles, and histograms
//! - **Permutation tests**: Monte Carlo and exact two-group randomization tests
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`histogram`]: Histogram construction for visualizing data distributions
//! - [`comprehensive`]: Comprehensive statistical analysis combining multiple measures
//! - [`permutation`]: Permutation-test engine with slice and mask partitions
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use botortop_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Running a permutation test
//!
//! ```
//! use botortop_stats::permutation::{DiffMeans, PermutationTest};
//! use rand::{SeedableRng as _, rngs::StdRng};
//!
//! let wins_a = [1.0, 0.0, 1.0, 1.0, 1.0];
//! let wins_b = [0.0, 0.0, 1.0, 0.0];
//! let result = PermutationTest::new(DiffMeans, 500)
//!     .run(&wins_a, &wins_b, &mut StdRng::seed_from_u64(1))
//!     .unwrap();
//! assert_eq!(result.null_distribution().len(), 500);
//! ```

pub mod comprehensive;
pub mod descriptive;
pub mod histogram;
pub mod percentiles;
pub mod permutation;
