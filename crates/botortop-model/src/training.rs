//! Win prediction from trade-game features.
//!
//! # Pipeline
//!
//! 1. Stratified 75/25 train/test split by game result
//! 2. **Baseline**: logistic regression on gank focus and objective conversion
//! 3. **Final**: random forest on lane and objective features, tuned by a
//!    cross-validated grid search
//! 4. Test-set AUC and accuracy for both models
//! 5. Feature importances of the final model
//! 6. Fairness of the final model across gank focus

use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::Serialize;

use botortop_analysis::{features::TradeRow, trade::GankFocus};

use crate::{
    ModelError,
    fairness::{self, FairnessReport},
    forest::{ForestParams, RandomForest},
    logistic::LogisticRegression,
    metrics,
    split::stratified_split,
    tuning::{GridSearch, ParamGrid},
};

pub const DEFAULT_SEED: u64 = 42;
pub const TEST_FRACTION: f64 = 0.25;
pub const CV_FOLDS: usize = 5;

/// Named feature columns extracted from a trade row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSet {
    Baseline,
    Advanced,
}

impl FeatureSet {
    #[must_use]
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Baseline => &["gank_focus_encoded", "obj_conversion"],
            Self::Advanced => &[
                "obj_conversion",
                "lii_top",
                "lii_bot",
                "lii_diff",
                "top_xpdiff10",
                "bot_xpdiff10",
                "dragons",
                "heralds",
                "gank_focus_encoded",
            ],
        }
    }

    /// Feature values of one row, in [`Self::names`] order.
    ///
    /// Non-finite values are replaced by 0.
    #[must_use]
    pub fn extract(self, row: &TradeRow) -> Vec<f64> {
        let values = match self {
            Self::Baseline => vec![row.gank_focus.encoded(), row.obj_conversion],
            Self::Advanced => vec![
                row.obj_conversion,
                row.lii_top,
                row.lii_bot,
                row.lii_diff,
                row.top_xpdiff10,
                row.bot_xpdiff10,
                row.dragons,
                row.heralds,
                row.gank_focus.encoded(),
            ],
        };
        values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect()
    }

    #[must_use]
    pub fn matrix<'a>(self, rows: impl IntoIterator<Item = &'a TradeRow>) -> Vec<Vec<f64>> {
        rows.into_iter().map(|row| self.extract(row)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub model_name: String,
    pub auc: f64,
    pub accuracy: f64,
}

impl ModelScore {
    fn new(model_name: &str, labels: &[bool], proba: &[f64]) -> Self {
        Self {
            model_name: model_name.to_owned(),
            auc: metrics::roc_auc(labels, proba),
            accuracy: metrics::accuracy(labels, &crate::threshold(proba)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalModelReport {
    #[serde(flatten)]
    pub score: ModelScore,
    pub best_params: ForestParams,
    pub cv_auc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Contents of `model_results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResults {
    pub n_train: usize,
    pub n_test: usize,
    pub baseline: ModelScore,
    #[serde(rename = "final")]
    pub final_model: FinalModelReport,
    /// Sorted by importance, descending
    pub feature_importance: Vec<FeatureImportance>,
    pub fairness: FairnessReport,
    /// RFC 3339 timestamp
    pub trained_at: String,
}

/// Training configuration; [`Default`] matches the published analysis.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub grid: ParamGrid,
    pub fairness_permutations: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_fraction: TEST_FRACTION,
            cv_folds: CV_FOLDS,
            grid: ParamGrid::default(),
            fairness_permutations: fairness::DEFAULT_PERMUTATIONS,
        }
    }
}

/// Sorted `(feature, importance)` pairs.
#[must_use]
pub fn rank_importances(names: &[&str], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| FeatureImportance {
            feature: (*name).to_owned(),
            importance,
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

/// Splits per-row values into (bot-focus, top-focus) groups.
fn split_by_focus(rows: &[&TradeRow], values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let (mut bot, mut top) = (vec![], vec![]);
    for (row, &value) in rows.iter().zip(values) {
        match row.gank_focus {
            GankFocus::Bot => bot.push(value),
            GankFocus::Top => top.push(value),
        }
    }
    (bot, top)
}

/// Trains and evaluates both models on the processed trade rows.
pub fn train(rows: &[TradeRow], config: &TrainConfig) -> Result<ModelResults, ModelError> {
    if rows.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    let labels = rows.iter().map(TradeRow::is_win).collect::<Vec<_>>();
    let mut rng = Pcg32::seed_from_u64(config.seed);
    let split = stratified_split(&labels, config.test_fraction, &mut rng);
    tracing::info!(
        train = split.train.len(),
        test = split.test.len(),
        "split trade rows"
    );

    let train_rows = split.train.iter().map(|&i| &rows[i]).collect::<Vec<_>>();
    let test_rows = split.test.iter().map(|&i| &rows[i]).collect::<Vec<_>>();
    let y_train = split.train.iter().map(|&i| labels[i]).collect::<Vec<_>>();
    let y_test = split.test.iter().map(|&i| labels[i]).collect::<Vec<_>>();

    // Baseline
    let x_train = FeatureSet::Baseline.matrix(train_rows.iter().copied());
    let x_test = FeatureSet::Baseline.matrix(test_rows.iter().copied());
    let mut baseline = LogisticRegression::new();
    baseline.fit(&x_train, &y_train)?;
    let baseline_score = ModelScore::new(
        "Baseline (Logistic Regression)",
        &y_test,
        &baseline.predict_proba(&x_test),
    );
    tracing::info!(
        auc = baseline_score.auc,
        accuracy = baseline_score.accuracy,
        "baseline model evaluated"
    );

    // Final
    let x_train = FeatureSet::Advanced.matrix(train_rows.iter().copied());
    let x_test = FeatureSet::Advanced.matrix(test_rows.iter().copied());
    let search = GridSearch::new(config.grid.clone(), config.cv_folds, config.seed)
        .fit(&x_train, &y_train)?;
    let mut forest = RandomForest::new(search.best_params, config.seed);
    forest.fit(&x_train, &y_train)?;
    let proba = forest.predict_proba(&x_test);
    let final_score = ModelScore::new("Final (Random Forest)", &y_test, &proba);
    tracing::info!(
        auc = final_score.auc,
        accuracy = final_score.accuracy,
        "final model evaluated"
    );

    let feature_importance =
        rank_importances(FeatureSet::Advanced.names(), &forest.feature_importances());

    // Fairness across gank focus
    let correct = fairness::correctness(&y_test, &crate::threshold(&proba));
    let (bot_correct, top_correct) = split_by_focus(&test_rows, &correct);
    let fairness = fairness::fairness_test(
        &bot_correct,
        &top_correct,
        config.fairness_permutations,
        &mut rng,
    )?;

    Ok(ModelResults {
        n_train: split.train.len(),
        n_test: split.test.len(),
        baseline: baseline_score,
        final_model: FinalModelReport {
            score: final_score,
            best_params: search.best_params,
            cv_auc: search.best_score,
        },
        feature_importance,
        fairness,
        trained_at: chrono::Utc::now().to_rfc3339(),
    })
}
