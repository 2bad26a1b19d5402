//! Hyperparameter grid search with stratified cross-validation.
//!
//! # Parallelization
//!
//! Every grid candidate is scored on its own scoped thread. The folds are
//! drawn once, up front, and each candidate's forests are seeded from the
//! search seed, so scores do not depend on thread scheduling.

use std::thread;

use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::Serialize;

use botortop_stats::descriptive;

use crate::{
    ModelError,
    forest::{ForestParams, RandomForest},
    metrics,
    split::{Split, StratifiedKFold},
};

/// Candidate values for each forest hyperparameter.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 300],
            max_depth: vec![Some(5), Some(10), None],
            min_samples_leaf: vec![1, 5],
        }
    }
}

impl ParamGrid {
    /// Every combination, in nested declaration order.
    ///
    /// ```
    /// use botortop_model::tuning::ParamGrid;
    ///
    /// assert_eq!(ParamGrid::default().candidates().len(), 12);
    /// ```
    #[must_use]
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut candidates = vec![];
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &min_samples_leaf in &self.min_samples_leaf {
                    candidates.push(ForestParams {
                        n_estimators,
                        max_depth,
                        min_samples_leaf,
                    });
                }
            }
        }
        candidates
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub params: ForestParams,
    pub mean_auc: f64,
    pub fold_aucs: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    folds: StratifiedKFold,
    seed: u64,
}

fn select(x: &[Vec<f64>], y: &[bool], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<bool>) {
    indices.iter().map(|&i| (x[i].clone(), y[i])).unzip()
}

impl GridSearch {
    #[must_use]
    pub fn new(grid: ParamGrid, n_folds: usize, seed: u64) -> Self {
        Self {
            grid,
            folds: StratifiedKFold::new(n_folds),
            seed,
        }
    }

    fn score_candidate(
        &self,
        params: ForestParams,
        x: &[Vec<f64>],
        y: &[bool],
        splits: &[Split],
    ) -> Result<CandidateScore, ModelError> {
        let fold_aucs = splits
            .iter()
            .map(|split| {
                let (x_train, y_train) = select(x, y, &split.train);
                let (x_test, y_test) = select(x, y, &split.test);
                let mut forest = RandomForest::new(params, self.seed);
                forest.fit(&x_train, &y_train)?;
                Ok(metrics::roc_auc(&y_test, &forest.predict_proba(&x_test)))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        Ok(CandidateScore {
            params,
            mean_auc: descriptive::mean(&fold_aucs),
            fold_aucs,
        })
    }

    /// Scores every candidate and picks the highest mean fold AUC.
    ///
    /// Ties keep the earlier candidate; `NaN` scores never win.
    pub fn fit(&self, x: &[Vec<f64>], y: &[bool]) -> Result<GridSearchResult, ModelError> {
        crate::check_training_set(x, y)?;
        let n_splits = self.folds.n_splits();
        let min_class = y
            .iter()
            .filter(|&&l| l)
            .count()
            .min(y.iter().filter(|&&l| !l).count());
        if min_class < n_splits {
            return Err(ModelError::TooFewSamples {
                class_count: min_class,
                n_splits,
            });
        }

        let splits = self.folds.split(y, &mut Pcg32::seed_from_u64(self.seed));
        let candidates = self.grid.candidates();
        tracing::info!(
            candidates = candidates.len(),
            folds = n_splits,
            rows = x.len(),
            "starting grid search"
        );

        let splits = &splits;
        let scores = thread::scope(|s| {
            let handles = candidates
                .iter()
                .map(|&params| s.spawn(move || self.score_candidate(params, x, y, splits)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(score) => score,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut best: Option<&CandidateScore> = None;
        for score in &scores {
            tracing::debug!(params = ?score.params, mean_auc = score.mean_auc, "scored candidate");
            if best.is_none_or(|b| b.mean_auc.is_nan() || score.mean_auc > b.mean_auc) {
                best = Some(score);
            }
        }
        let (best_params, best_score) = best
            .map(|b| (b.params, b.mean_auc))
            .ok_or(ModelError::EmptyGrid)?;
        tracing::info!(params = ?best_params, cv_auc = best_score, "grid search finished");

        Ok(GridSearchResult {
            best_params,
            best_score,
            candidates: scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Positives lie in `[10, 16]`, negatives in `[0, 6]`.
    fn data() -> (Vec<Vec<f64>>, Vec<bool>) {
        (0..40)
            .map(|i| {
                let label = i % 2 == 0;
                let v = f64::from(i % 7);
                (vec![if label { 10.0 + v } else { v }], label)
            })
            .unzip()
    }

    fn small_grid() -> ParamGrid {
        ParamGrid {
            n_estimators: vec![5],
            max_depth: vec![Some(1), None],
            min_samples_leaf: vec![1, 20],
        }
    }

    #[test]
    fn test_grid_search_scores_every_candidate() {
        let (x, y) = data();
        let result = GridSearch::new(small_grid(), 5, 42).fit(&x, &y).unwrap();
        assert_eq!(result.candidates.len(), 4);
        assert!(result.candidates.iter().all(|c| c.fold_aucs.len() == 5));
        assert_eq!(result.best_score, 1.0);
        assert!(
            result
                .candidates
                .iter()
                .all(|c| c.mean_auc <= result.best_score)
        );
    }

    #[test]
    fn test_grid_search_is_deterministic() {
        let (x, y) = data();
        let a = GridSearch::new(small_grid(), 3, 1).fit(&x, &y).unwrap();
        let b = GridSearch::new(small_grid(), 3, 1).fit(&x, &y).unwrap();
        assert_eq!(a.best_params, b.best_params);
        let a = a.candidates.iter().map(|c| c.mean_auc).collect::<Vec<_>>();
        let b = b.candidates.iter().map(|c| c.mean_auc).collect::<Vec<_>>();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_samples_per_class() {
        let x = vec![vec![0.0]; 6];
        let y = [true, true, false, false, false, false];
        assert!(matches!(
            GridSearch::new(small_grid(), 5, 0).fit(&x, &y),
            Err(ModelError::TooFewSamples { class_count: 2, .. })
        ));
    }
}
