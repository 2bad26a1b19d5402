//! Logistic regression trained by batch gradient descent.
//!
//! Inputs are standardized (zero mean, unit variance per column) before
//! fitting; the fitted scaler is kept with the model and applied on
//! prediction.
//!
//! # Examples
//!
//! ```
//! use botortop_model::logistic::LogisticRegression;
//!
//! let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
//! let y = [false, false, true, true];
//!
//! let mut model = LogisticRegression::new();
//! model.fit(&x, &y)?;
//! assert_eq!(model.predict(&x), y);
//! # Ok::<(), botortop_model::ModelError>(())
//! ```

use crate::ModelError;

/// Per-column standardization fitted on training data.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Constant columns get a unit scale.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(x: &[Vec<f64>]) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let n = x.len() as f64;
        let means = (0..n_features)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect::<Vec<_>>();
        let scales = (0..n_features)
            .map(|j| {
                let var = x.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
                let sd = var.sqrt();
                if sd > 0.0 { sd } else { 1.0 }
            })
            .collect();
        Self { means, scales }
    }

    #[must_use]
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (mean, scale))| (v - mean) / scale)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    learning_rate: f64,
    max_iter: usize,
    tol: f64,
    scaler: StandardScaler,
    coefficients: Vec<f64>,
    intercept: f64,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    #[must_use]
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            scaler: StandardScaler::default(),
            coefficients: vec![],
            intercept: 0.0,
            n_iter: 0,
        }
    }

    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stops early once every gradient component is below `tol`.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Coefficients on the standardized features.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Gradient steps taken by the last [`Self::fit`].
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[bool]) -> Result<(), ModelError> {
        crate::check_training_set(x, y)?;

        self.scaler = StandardScaler::fit(x);
        let x = x
            .iter()
            .map(|row| self.scaler.transform_row(row))
            .collect::<Vec<_>>();
        let n_features = x[0].len();
        let n = x.len() as f64;

        self.coefficients = vec![0.0; n_features];
        self.intercept = 0.0;
        self.n_iter = self.max_iter;

        let mut coef_grad = vec![0.0; n_features];
        for iter in 0..self.max_iter {
            coef_grad.fill(0.0);
            let mut intercept_grad = 0.0;
            for (row, &label) in x.iter().zip(y) {
                let error = self.proba_scaled(row) - f64::from(u8::from(label));
                intercept_grad += error;
                for (g, v) in coef_grad.iter_mut().zip(row) {
                    *g += error * v;
                }
            }
            intercept_grad /= n;
            for g in &mut coef_grad {
                *g /= n;
            }

            self.intercept -= self.learning_rate * intercept_grad;
            for (c, g) in self.coefficients.iter_mut().zip(&coef_grad) {
                *c -= self.learning_rate * g;
            }

            if intercept_grad.abs() < self.tol && coef_grad.iter().all(|g| g.abs() < self.tol) {
                self.n_iter = iter + 1;
                break;
            }
        }
        tracing::debug!(
            n_iter = self.n_iter,
            intercept = self.intercept,
            "fitted logistic regression"
        );
        Ok(())
    }

    fn proba_scaled(&self, row: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>();
        sigmoid(z)
    }

    /// Probability of the positive class for each row.
    #[must_use]
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter()
            .map(|row| self.proba_scaled(&self.scaler.transform_row(row)))
            .collect()
    }

    /// Positive-class predictions at a 0.5 threshold.
    #[must_use]
    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<bool> {
        crate::threshold(&self.predict_proba(x))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::metrics;

    #[test]
    fn test_scaler_constant_column() {
        let scaler = StandardScaler::fit(&[vec![1.0, 5.0], vec![3.0, 5.0]]);
        assert_eq!(scaler.transform_row(&[1.0, 5.0]), vec![-1.0, 0.0]);
    }

    #[test]
    fn test_fit_separable_gaussians() {
        let mut rng = Pcg32::seed_from_u64(3);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut x = vec![];
        let mut y = vec![];
        for i in 0..200 {
            let label = i % 2 == 0;
            let shift = if label { 2.0 } else { -2.0 };
            x.push(vec![shift + noise.sample(&mut rng), noise.sample(&mut rng)]);
            y.push(label);
        }

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert!(model.coefficients()[0] > 0.0);
        assert!(model.coefficients()[0].abs() > model.coefficients()[1].abs());

        let auc = metrics::roc_auc(&y, &model.predict_proba(&x));
        assert!(auc > 0.95, "auc = {auc}");
        assert!(metrics::accuracy(&y, &model.predict(&x)) > 0.9);
    }

    #[test]
    fn test_empty_training_set() {
        let mut model = LogisticRegression::new();
        assert!(matches!(
            model.fit(&[], &[]),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}
