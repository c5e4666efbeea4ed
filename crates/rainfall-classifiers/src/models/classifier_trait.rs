use ndarray::{Array1, Array2};

use crate::error::Result;

/// A small trait abstraction for the binary classifiers that consume the
/// extracted feature rows. Labels use 1 for threshold exceedance and 0
/// otherwise.
pub trait ClassifierModel {
    /// Fit the model on `(n_samples, n_features)` rows and parallel labels.
    /// A failed fit keeps whatever state the model had before.
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Raw margins of the linear decision function, one per row.
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// `(n_samples, 2)` probabilities: column 0 for label 0, column 1 for label 1.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Hard labels from `predict_proba` at the 0.5 cut.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(1).mapv(|p| u8::from(p >= 0.5)))
    }

    fn is_fitted(&self) -> bool;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
