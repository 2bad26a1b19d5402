//! Classification metrics.

use std::cmp::Ordering;

/// Area under the ROC curve of `scores` against binary `labels`.
///
/// Computed as the Mann-Whitney U statistic of the positive-class ranks, with
/// tied scores sharing their average rank. Returns `NaN` when `labels` holds a
/// single class.
///
/// # Panics
///
/// Panics if `labels` and `scores` differ in length.
///
/// ```
/// use botortop_model::metrics::roc_auc;
///
/// let labels = [false, false, true, true];
/// assert_eq!(roc_auc(&labels, &[0.1, 0.4, 0.35, 0.8]), 0.75);
/// assert_eq!(roc_auc(&labels, &[0.5; 4]), 0.5);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> f64 {
    assert_eq!(labels.len(), scores.len(), "labels and scores differ in length");

    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order = (0..scores.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; a tie group shares the mean of its ranks
        let rank = (start + 1 + end) as f64 / 2.0;
        let positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        pos_rank_sum += rank * positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    u / (n_pos * n_neg as f64)
}

/// Fraction of predictions equal to the labels; `NaN` when empty.
///
/// ```
/// use botortop_model::metrics::accuracy;
///
/// assert_eq!(accuracy(&[true, false, true, true], &[true, true, true, false]), 0.5);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn accuracy(labels: &[bool], predictions: &[bool]) -> f64 {
    assert_eq!(labels.len(), predictions.len());
    if labels.is_empty() {
        return f64::NAN;
    }
    let correct = labels
        .iter()
        .zip(predictions)
        .filter(|(l, p)| l == p)
        .count();
    correct as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_perfect_ranking() {
        let labels = [false, true, false, true, true];
        let scores = [0.1, 0.9, 0.2, 0.7, 0.8];
        assert_eq!(roc_auc(&labels, &scores), 1.0);
        let reversed = scores.map(|s| -s);
        assert_eq!(roc_auc(&labels, &reversed), 0.0);
    }

    #[test]
    fn test_single_class_is_nan() {
        assert!(roc_auc(&[true, true], &[0.1, 0.2]).is_nan());
        assert!(accuracy(&[], &[]).is_nan());
    }

    proptest! {
        #[test]
        fn prop_auc_bounded_and_complementary(
            data in prop::collection::vec((any::<bool>(), 0.0..1.0_f64), 2..60),
        ) {
            let labels = data.iter().map(|(l, _)| *l).collect::<Vec<_>>();
            let scores = data.iter().map(|(_, s)| *s).collect::<Vec<_>>();
            let auc = roc_auc(&labels, &scores);
            prop_assume!(!auc.is_nan());
            prop_assert!((0.0..=1.0).contains(&auc));

            let negated = scores.iter().map(|s| -s).collect::<Vec<_>>();
            prop_assert!((roc_auc(&labels, &negated) - (1.0 - auc)).abs() < 1e-9);
        }
    }
}
