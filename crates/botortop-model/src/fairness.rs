//! Does the model predict bot-focus games as well as top-focus games?
//!
//! The per-row correctness indicators (1 = correct prediction) of the two
//! groups are compared with a two-sided difference-in-means permutation test,
//! which is exactly a test on the accuracy difference.

use rand::Rng;
use serde::Serialize;

use botortop_stats::{
    descriptive,
    permutation::{Alternative, DiffMeans, PermutationTest, PermutationTestError},
};

pub const DEFAULT_PERMUTATIONS: usize = 1_000;
/// The model counts as fair when the test's p-value exceeds this.
pub const FAIRNESS_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Serialize)]
pub struct FairnessReport {
    pub bot_accuracy: f64,
    pub top_accuracy: f64,
    /// `bot_accuracy - top_accuracy`
    pub accuracy_difference: f64,
    pub p_value: f64,
    pub is_fair: bool,
    pub n_bot: usize,
    pub n_top: usize,
    pub n_permutations: usize,
}

/// Correctness indicator per row.
#[must_use]
pub fn correctness(labels: &[bool], predictions: &[bool]) -> Vec<f64> {
    labels
        .iter()
        .zip(predictions)
        .map(|(l, p)| if l == p { 1.0 } else { 0.0 })
        .collect()
}

/// Tests whether accuracy differs between the bot-focus and top-focus rows.
pub fn fairness_test<R>(
    bot_correct: &[f64],
    top_correct: &[f64],
    n_permutations: usize,
    rng: &mut R,
) -> Result<FairnessReport, PermutationTestError>
where
    R: Rng + ?Sized,
{
    let result = PermutationTest::new(DiffMeans, n_permutations)
        .with_alternative(Alternative::TwoSided)
        .run(bot_correct, top_correct, rng)?;
    let bot_accuracy = descriptive::mean(bot_correct);
    let top_accuracy = descriptive::mean(top_correct);
    let is_fair = result.p_value() > FAIRNESS_ALPHA;
    tracing::info!(
        bot_accuracy,
        top_accuracy,
        p_value = result.p_value(),
        is_fair,
        "fairness test finished"
    );
    Ok(FairnessReport {
        bot_accuracy,
        top_accuracy,
        accuracy_difference: result.observed(),
        p_value: result.p_value(),
        is_fair,
        n_bot: bot_correct.len(),
        n_top: top_correct.len(),
        n_permutations,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_correctness() {
        assert_eq!(
            correctness(&[true, false, true], &[true, true, true]),
            vec![1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_equal_accuracy_is_fair() {
        let bot = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let top = [0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let report = fairness_test(&bot, &top, 500, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(report.accuracy_difference, 0.0);
        assert_eq!(report.p_value, 1.0);
        assert!(report.is_fair);
    }

    #[test]
    fn test_disparate_accuracy_is_unfair() {
        let bot = [1.0; 30];
        let top = [0.0; 30];
        let report = fairness_test(&bot, &top, 500, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(report.accuracy_difference, 1.0);
        assert!(report.p_value < FAIRNESS_ALPHA);
        assert!(!report.is_fair);
    }

    #[test]
    fn test_empty_group_rejected() {
        let err = fairness_test(&[1.0], &[], 10, &mut Pcg32::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, PermutationTestError::EmptySample { .. }));
    }
}
