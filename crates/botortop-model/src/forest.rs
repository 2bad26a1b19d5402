//! Random forest classifier.
//!
//! Each tree is grown on a bootstrap sample of the training rows and
//! considers `floor(sqrt(n_features))` randomly chosen features per split.
//! Predicted probabilities are the mean of the trees' leaf probabilities.
//!
//! All randomness comes from one generator seeded with [`RandomForest::seed`],
//! so fitting the same data twice yields the same forest.

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    ModelError,
    tree::{DecisionTree, TreeParams},
};

/// Tunable forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees without a depth limit
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    seed: u64,
    trees: Vec<DecisionTree>,
}

/// `floor(sqrt(n_features))`, at least 1.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt() as usize).max(1)
}

impl RandomForest {
    #[must_use]
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            trees: vec![],
        }
    }

    #[must_use]
    pub fn params(&self) -> ForestParams {
        self.params
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<(), ModelError> {
        crate::check_training_set(x, y)?;
        if self.params.n_estimators == 0 {
            return Err(ModelError::NoEstimators);
        }

        let n = x.len();
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: Some(sqrt_features(x[0].len())),
        };
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut samples = vec![0; n];

        self.trees = (0..self.params.n_estimators)
            .map(|_| {
                for s in &mut samples {
                    *s = rng.random_range(0..n);
                }
                let mut tree = DecisionTree::new(tree_params);
                tree.fit_samples(x, y, &mut samples, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<_, ModelError>>()?;

        tracing::debug!(
            n_estimators = self.params.n_estimators,
            max_depth = ?self.params.max_depth,
            min_samples_leaf = self.params.min_samples_leaf,
            "fitted random forest"
        );
        Ok(())
    }

    /// Mean positive-class probability over all trees.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<f64> {
        let n_trees = self.trees.len() as f64;
        x.iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|tree| tree.predict_proba_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect()
    }

    #[must_use]
    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<bool> {
        crate::threshold(&self.predict_proba(x))
    }

    /// Mean decrease in impurity per feature, averaged over trees and
    /// normalized to sum to 1 (all zeros if no tree ever split).
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let Some(first) = self.trees.first() else {
            return vec![];
        };
        let mut sums = vec![0.0; first.feature_importances().len()];
        for tree in &self.trees {
            for (sum, value) in sums.iter_mut().zip(tree.feature_importances()) {
                *sum += value;
            }
        }
        let total = sums.iter().sum::<f64>();
        if total > 0.0 {
            for sum in &mut sums {
                *sum /= total;
            }
        }
        sums
    }
}
