//! Bot-focus vs top-focus permutation tests.
//!
//! Both tests compare a binary outcome between the two gank-focus groups with a
//! two-sided difference in means:
//!
//! 1. objective conversion rate
//! 2. win rate

use rand::Rng;
use serde::Serialize;

use botortop_stats::{
    descriptive,
    histogram::Histogram,
    permutation::{Alternative, DiffMeans, PermutationTest, PermutationTestError, TestResult},
};

use crate::{
    features::{TradeRow, focus_values},
    trade::GankFocus,
};

pub const DEFAULT_PERMUTATIONS: usize = 10_000;
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const NULL_HISTOGRAM_BINS: usize = 50;

/// Result of one bot-vs-top group test.
#[derive(Debug, Clone, Serialize)]
pub struct GroupTestReport {
    pub test_name: String,
    pub observed_stat: f64,
    pub p_value: f64,
    pub alternative: Alternative,
    pub n_permutations: usize,
    pub bot_mean: f64,
    pub top_mean: f64,
    pub interpretation: String,
    pub non_finite_count: usize,
    pub null_histogram: Histogram,
}

/// Human-readable verdict at [`SIGNIFICANCE_LEVEL`].
#[must_use]
pub fn interpret(result: &TestResult) -> &'static str {
    if result.is_significant(SIGNIFICANCE_LEVEL) {
        "Significant"
    } else {
        "Not significant"
    }
}

impl GroupTestReport {
    fn new(test_name: &str, bot: &[f64], top: &[f64], result: &TestResult) -> Self {
        Self {
            test_name: test_name.to_owned(),
            observed_stat: result.observed(),
            p_value: result.p_value(),
            alternative: result.alternative(),
            n_permutations: result.null_distribution().len(),
            bot_mean: descriptive::mean(bot),
            top_mean: descriptive::mean(top),
            interpretation: interpret(result).to_owned(),
            non_finite_count: result.non_finite_count(),
            null_histogram: Histogram::new(
                result.null_distribution().iter().copied(),
                NULL_HISTOGRAM_BINS,
                None,
                None,
            ),
        }
    }
}

/// Contents of `hypothesis_tests.json`.
#[derive(Debug, Clone, Serialize)]
pub struct HypothesisTests {
    pub test1: GroupTestReport,
    pub test2: GroupTestReport,
}

/// Tests `field` between bot-focus (group A) and top-focus (group B) rows.
pub fn focus_test<R>(
    test_name: &str,
    rows: &[TradeRow],
    field: impl Fn(&TradeRow) -> f64,
    n_permutations: usize,
    rng: &mut R,
) -> Result<GroupTestReport, PermutationTestError>
where
    R: Rng + ?Sized,
{
    let bot = focus_values(rows, GankFocus::Bot, &field);
    let top = focus_values(rows, GankFocus::Top, &field);
    let result = PermutationTest::new(DiffMeans, n_permutations)
        .with_alternative(Alternative::TwoSided)
        .run(&bot, &top, rng)?;
    tracing::info!(
        test = test_name,
        observed = result.observed(),
        p_value = result.p_value(),
        "permutation test finished"
    );
    Ok(GroupTestReport::new(test_name, &bot, &top, &result))
}

/// Runs the objective-conversion test and then the win-rate test.
pub fn run_all<R>(
    rows: &[TradeRow],
    n_permutations: usize,
    rng: &mut R,
) -> Result<HypothesisTests, PermutationTestError>
where
    R: Rng + ?Sized,
{
    let test1 = focus_test(
        "Objective Conversion Rate (Bot vs Top)",
        rows,
        |r| r.obj_conversion,
        n_permutations,
        rng,
    )?;
    let test2 = focus_test(
        "Win Rate (Bot vs Top)",
        rows,
        |r| r.result,
        n_permutations,
        rng,
    )?;
    Ok(HypothesisTests { test1, test2 })
}
