//! Win-prediction models for cross-map trade games.
//!
//! The learners here are implemented in-crate and sized for the trade dataset
//! (a few thousand rows, a handful of features):
//!
//! - [`logistic`]: standardized logistic regression (the baseline)
//! - [`tree`] and [`forest`]: CART trees and a bootstrap random forest
//! - [`split`]: stratified train/test splits and k-fold cross-validation
//! - [`tuning`]: parallel grid search over forest hyperparameters
//! - [`metrics`]: ROC AUC and accuracy
//! - [`fairness`]: accuracy parity across gank focus via a permutation test
//! - [`training`]: the end-to-end pipeline producing `model_results.json`
//!
//! Feature matrices are row-major `&[Vec<f64>]`; labels are `&[bool]` with
//! `true` for a win.

use botortop_stats::permutation::PermutationTestError;

pub mod fairness;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod split;
pub mod training;
pub mod tree;
pub mod tuning;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ModelError {
    #[display("training set is empty")]
    EmptyTrainingSet,
    #[display("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[display("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("random forest needs at least one tree")]
    NoEstimators,
    #[display("smallest class has {class_count} rows, fewer than {n_splits} folds")]
    TooFewSamples { class_count: usize, n_splits: usize },
    #[display("parameter grid is empty")]
    EmptyGrid,
    #[display("fairness test failed")]
    #[from]
    Fairness(PermutationTestError),
}

/// Validates that `x` and `y` are non-empty, aligned and rectangular.
pub(crate) fn check_training_set(x: &[Vec<f64>], y: &[bool]) -> Result<(), ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    let expected = x[0].len();
    if let Some((row, found)) = x
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|(_, len)| *len != expected)
    {
        return Err(ModelError::RaggedRow {
            row,
            expected,
            found,
        });
    }
    Ok(())
}

/// Positive-class predictions: probability strictly above one half.
pub(crate) fn threshold(proba: &[f64]) -> Vec<bool> {
    proba.iter().map(|&p| p > 0.5).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_training_set() {
        assert!(check_training_set(&[vec![1.0], vec![2.0]], &[true, false]).is_ok());
        assert!(matches!(
            check_training_set(&[vec![1.0]], &[true, false]),
            Err(ModelError::LengthMismatch { rows: 1, labels: 2 })
        ));
        assert!(matches!(
            check_training_set(&[vec![1.0], vec![]], &[true, false]),
            Err(ModelError::RaggedRow { row: 1, .. })
        ));
    }
}
