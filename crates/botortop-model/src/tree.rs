//! CART decision tree for binary classification with Gini impurity.

use rand::{Rng, seq::index};

use crate::ModelError;

/// Gini impurity of a node with `pos` positives among `n` samples.
///
/// ```
/// use botortop_model::tree::gini_impurity;
///
/// assert_eq!(gini_impurity(0, 4), 0.0);
/// assert_eq!(gini_impurity(2, 4), 0.5);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn gini_impurity(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Fraction of positive training samples
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Weighted impurity decrease, in samples
    decrease: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    params: TreeParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

struct Builder<'a, R: ?Sized> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    params: TreeParams,
    n_features: usize,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<R> Builder<'_, R>
where
    R: Rng + ?Sized,
{
    #[expect(clippy::cast_precision_loss)]
    fn build(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let pos = samples.iter().filter(|&&i| self.y[i]).count();
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: pos as f64 / n as f64,
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || pos == 0 || pos == n || n < 2 * self.params.min_samples_leaf {
            return id;
        }
        let Some(best) = self.best_split(samples, pos) else {
            return id;
        };

        self.importances[best.feature] += best.decrease;
        let x = self.x;
        samples.sort_unstable_by(|&a, &b| x[a][best.feature].total_cmp(&x[b][best.feature]));
        let n_left = samples.partition_point(|&i| x[i][best.feature] <= best.threshold);
        let (left_samples, right_samples) = samples.split_at_mut(n_left);
        let left = self.build(left_samples, depth + 1);
        let right = self.build(right_samples, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    /// Best threshold over a random subset of features, or `None` when no
    /// split decreases impurity while respecting `min_samples_leaf`.
    #[expect(clippy::cast_precision_loss)]
    fn best_split(&mut self, samples: &[usize], pos: usize) -> Option<BestSplit> {
        let n = samples.len();
        let parent = n as f64 * gini_impurity(pos, n);
        let max_features = self
            .params
            .max_features
            .unwrap_or(self.n_features)
            .clamp(1, self.n_features);
        let features = index::sample(&mut *self.rng, self.n_features, max_features);

        let x = self.x;
        let mut best: Option<BestSplit> = None;
        let mut order = samples.to_vec();
        for feature in features {
            let column = |i: usize| x[i][feature];
            order.sort_unstable_by(|&a, &b| column(a).total_cmp(&column(b)));

            let mut left_pos = 0;
            for k in 1..n {
                left_pos += usize::from(self.y[order[k - 1]]);
                let (lo, hi) = (column(order[k - 1]), column(order[k]));
                if lo == hi {
                    continue;
                }
                let (n_left, n_right) = (k, n - k);
                if n_left < self.params.min_samples_leaf || n_right < self.params.min_samples_leaf
                {
                    continue;
                }
                let children = n_left as f64 * gini_impurity(left_pos, n_left)
                    + n_right as f64 * gini_impurity(pos - left_pos, n_right);
                let decrease = parent - children;
                if decrease > best.map_or(f64::EPSILON, |b| b.decrease) {
                    best = Some(BestSplit {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}

impl DecisionTree {
    #[must_use]
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: vec![],
            importances: vec![],
        }
    }

    /// Fits on the rows listed in `samples` (repeats allowed, as in a bootstrap).
    pub fn fit_samples<R>(
        &mut self,
        x: &[Vec<f64>],
        y: &[bool],
        samples: &mut [usize],
        rng: &mut R,
    ) -> Result<(), ModelError>
    where
        R: Rng + ?Sized,
    {
        crate::check_training_set(x, y)?;
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let n_features = x[0].len();
        let mut builder = Builder {
            x,
            y,
            params: self.params,
            n_features,
            rng,
            nodes: vec![],
            importances: vec![0.0; n_features],
        };
        builder.build(samples, 0);
        self.nodes = builder.nodes;
        self.importances = builder.importances;
        Ok(())
    }

    pub fn fit<R>(&mut self, x: &[Vec<f64>], y: &[bool], rng: &mut R) -> Result<(), ModelError>
    where
        R: Rng + ?Sized,
    {
        let mut samples = (0..x.len()).collect::<Vec<_>>();
        self.fit_samples(x, y, &mut samples, rng)
    }

    /// Positive-class probability of one row.
    ///
    /// # Panics
    ///
    /// Panics if the tree has not been fitted.
    #[must_use]
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    #[must_use]
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_proba_row(row)).collect()
    }

    /// Total impurity decrease per feature, normalized to sum to 1.
    ///
    /// All zeros for a tree that never split.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let total = self.importances.iter().sum::<f64>();
        if total > 0.0 {
            self.importances.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; self.importances.len()]
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, left).max(depth_of(nodes, right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_threshold_split() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0]];
        let y = [false, false, false, true, true];
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(tree.depth(), 1);
        let probas = tree.predict_proba(&[vec![0.0], vec![6.6], vec![20.0]]);
        assert_eq!(probas, vec![0.0, 1.0, 1.0]);
        assert_eq!(tree.feature_importances(), vec![1.0]);
    }

    #[test]
    fn test_depth_limit() {
        let x = (1..=6).map(|v| vec![f64::from(v)]).collect::<Vec<_>>();
        let y = [false, false, true, true, false, false];

        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.predict_proba(&x), vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);

        let mut stump = DecisionTree::new(TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        });
        stump.fit(&x, &y, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(stump.depth(), 1);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let y = [false, false, false, true];
        let mut tree = DecisionTree::new(TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        });
        tree.fit(&x, &y, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(tree.predict_proba_row(&[4.0]), 0.5);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = vec![vec![1.0], vec![2.0]];
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &[true, true], &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.feature_importances(), vec![0.0]);
    }

    #[test]
    fn test_importances_ignore_constant_feature() {
        let x = vec![
            vec![0.0, 7.0],
            vec![1.0, 7.0],
            vec![2.0, 7.0],
            vec![3.0, 7.0],
        ];
        let y = [false, false, true, true];
        let mut tree = DecisionTree::new(TreeParams::default());
        tree.fit(&x, &y, &mut Pcg32::seed_from_u64(0)).unwrap();
        let importances = tree.feature_importances();
        assert_eq!(importances, vec![1.0, 0.0]);
        assert_eq!(tree.predict_proba_row(&[2.5, 7.0]), 1.0);
    }
}
