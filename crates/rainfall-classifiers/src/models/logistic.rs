//! Penalized logistic regression.
//!
//! Minimizes `mean(log_loss) + penalty(w) / (C * n)` with an unpenalized
//! intercept, which matches the liblinear scaling of `C`. The problem is
//! solved with accelerated proximal gradient (FISTA): the L1 proximal step is
//! a soft threshold, so weak features end up with coefficients of exactly 0.

use ndarray::{Array1, Array2, Axis};

use crate::config::{ModelConfig, ModelType, Penalty};
use crate::data_handling::validate_labels;
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

#[derive(Debug, Clone, PartialEq)]
struct LinearModel {
    coefficients: Array1<f64>,
    intercept: f64,
    n_iter: usize,
    converged: bool,
}

/// Logistic regression with an L1 or L2 coefficient penalty.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    params: ModelConfig,
    model: Option<LinearModel>,
}

impl LogisticClassifier {
    pub fn new(params: ModelConfig) -> Self {
        LogisticClassifier {
            params,
            model: None,
        }
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.model.as_ref().map(|m| &m.coefficients)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.intercept)
    }

    /// Iterations used by the last fit.
    pub fn n_iter(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.n_iter)
    }

    pub fn converged(&self) -> Option<bool> {
        self.model.as_ref().map(|m| m.converged)
    }

    /// Number of coefficients that are not exactly zero.
    pub fn n_nonzero(&self) -> Option<usize> {
        self.coefficients()
            .map(|w| w.iter().filter(|&&v| v != 0.0).count())
    }

    fn fitted(&self) -> Result<&LinearModel> {
        self.model
            .as_ref()
            .ok_or(PipelineError::NotFitted("LogisticClassifier"))
    }
}

/// Numerically stable logistic function.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

fn soft_threshold(v: f64, threshold: f64) -> f64 {
    if v > threshold {
        v - threshold
    } else if v < -threshold {
        v + threshold
    } else {
        0.0
    }
}

impl ClassifierModel for LogisticClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        self.params.validate()?;
        let ModelType::Logistic {
            penalty,
            c,
            max_iter,
            tol,
        } = self.params.model_type;

        let (nrows, ncols) = x.dim();
        if nrows == 0 {
            return Err(PipelineError::EmptyInput("logistic regression needs at least one sample"));
        }
        if y.len() != nrows {
            return Err(PipelineError::LengthMismatch {
                what: "labels",
                expected: nrows,
                got: y.len(),
            });
        }
        validate_labels(y)?;

        let n = nrows as f64;
        let target = Array1::from_iter(y.iter().map(|&v| f64::from(v)));
        let lambda = 1.0 / (c * n);

        // Lipschitz bound of the mean log-loss gradient over [X, 1]
        let mut lipschitz = 0.25 * (x.iter().map(|v| v * v).sum::<f64>() + n) / n;
        if penalty == Penalty::L2 {
            lipschitz += lambda;
        }
        let step = 1.0 / lipschitz;

        let mut w = Array1::<f64>::zeros(ncols);
        let mut b = 0.0;
        let mut z_w = w.clone();
        let mut z_b = b;
        let mut t = 1.0f64;
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 1..=max_iter {
            n_iter = iter;

            let margins = x.dot(&z_w) + z_b;
            let residual = margins.mapv(sigmoid) - &target;
            let mut grad_w = x.t().dot(&residual) / n;
            let grad_b = residual.sum() / n;
            if penalty == Penalty::L2 {
                grad_w = grad_w + &z_w * lambda;
            }

            let mut w_next = &z_w - &(grad_w * step);
            if penalty == Penalty::L1 {
                let threshold = step * lambda;
                w_next.mapv_inplace(|v| soft_threshold(v, threshold));
            }
            let b_next = z_b - step * grad_b;

            // restart the momentum when it points against the last step
            let w_step = &w_next - &w;
            let b_step = b_next - b;
            let uphill = (&z_w - &w_next).dot(&w_step) + (z_b - b_next) * b_step > 0.0;
            let t_next = if uphill {
                1.0
            } else {
                (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0
            };
            let momentum = if uphill { 0.0 } else { (t - 1.0) / t_next };

            z_w = &w_next + &(&w_step * momentum);
            z_b = b_next + momentum * b_step;

            let delta = w_step
                .iter()
                .fold(b_step.abs(), |acc, v| acc.max(v.abs()));
            w = w_next;
            b = b_next;
            t = t_next;

            if delta < tol {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "Logistic regression did not converge in {} iterations; consider raising max_iter",
                max_iter
            );
        }

        let n_nonzero = w.iter().filter(|&&v| v != 0.0).count();
        log::debug!(
            "Fitted {} on {} x {}: {} iterations, {} of {} coefficients non-zero",
            self.params.model_type.name(),
            nrows,
            ncols,
            n_iter,
            n_nonzero,
            ncols
        );

        self.model = Some(LinearModel {
            coefficients: w,
            intercept: b,
            n_iter,
            converged,
        });
        Ok(())
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.fitted()?;
        if x.ncols() != model.coefficients.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: model.coefficients.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&model.coefficients) + model.intercept)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let positive = self.decision_function(x)?.mapv(sigmoid);
        let negative = positive.mapv(|p| 1.0 - p);
        ndarray::stack(Axis(1), &[negative.view(), positive.view()]).map_err(|_| {
            PipelineError::DimensionMismatch {
                expected: 2,
                got: 0,
            }
        })
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn name(&self) -> &str {
        self.params.model_type.name()
    }
}
