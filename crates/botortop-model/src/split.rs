//! Class-stratified train/test splits and cross-validation folds.

use rand::{Rng, seq::SliceRandom as _};

/// Indices of each class (`[negatives, positives]`), shuffled.
fn shuffled_classes<R>(labels: &[bool], rng: &mut R) -> [Vec<usize>; 2]
where
    R: Rng + ?Sized,
{
    let mut classes = [vec![], vec![]];
    for (i, &label) in labels.iter().enumerate() {
        classes[usize::from(label)].push(i);
    }
    for indices in &mut classes {
        indices.shuffle(rng);
    }
    classes
}

/// Train and test row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits rows into train and test sets, keeping class ratios in both.
///
/// Each class contributes `round(test_fraction * class_size)` rows to the test
/// set. Both sets are sorted by index.
///
/// ```
/// use botortop_model::split::stratified_split;
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
///
/// let labels = [true, true, true, true, false, false, false, false];
/// let split = stratified_split(&labels, 0.25, &mut Pcg32::seed_from_u64(42));
/// assert_eq!(split.test.len(), 2);
/// assert_eq!(split.test.iter().filter(|&&i| labels[i]).count(), 1);
/// ```
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn stratified_split<R>(labels: &[bool], test_fraction: f64, rng: &mut R) -> Split
where
    R: Rng + ?Sized,
{
    let mut train = vec![];
    let mut test = vec![];
    for indices in shuffled_classes(labels, rng) {
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        let n_test = n_test.min(indices.len());
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

/// Stratified k-fold cross-validator.
///
/// Each class is shuffled and dealt into `n_splits` folds of near-equal size,
/// so every fold keeps the overall class ratio.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    /// # Panics
    ///
    /// Panics if `n_splits < 2`.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        assert!(n_splits >= 2, "need at least two folds");
        Self { n_splits }
    }

    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// One [`Split`] per fold, the fold being the test set.
    #[must_use]
    pub fn split<R>(&self, labels: &[bool], rng: &mut R) -> Vec<Split>
    where
        R: Rng + ?Sized,
    {
        let mut folds = vec![Vec::new(); self.n_splits];
        for indices in shuffled_classes(labels, rng) {
            let fold_size = indices.len() / self.n_splits;
            let remainder = indices.len() % self.n_splits;
            let mut start = 0;
            for (i, fold) in folds.iter_mut().enumerate() {
                let end = start + fold_size + usize::from(i < remainder);
                fold.extend_from_slice(&indices[start..end]);
                start = end;
            }
        }

        (0..self.n_splits)
            .map(|i| {
                let mut train = folds
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect::<Vec<_>>();
                let mut test = folds[i].clone();
                train.sort_unstable();
                test.sort_unstable();
                Split { train, test }
            })
            .collect()
    }
}
