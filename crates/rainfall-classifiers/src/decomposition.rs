//! Principal component analysis for flattened grids.
//!
//! The eigen-decomposition runs on whichever of the covariance (`p x p`) or
//! Gram (`n x n`) matrix is smaller, so wide grids with few samples stay
//! cheap. The output width is always `n_components`: directions beyond the
//! rank of the data are zero vectors.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};

use crate::error::{PipelineError, Result};

/// Fitted linear subspace: orthonormal directions plus the column means.
#[derive(Debug, Clone, PartialEq)]
pub struct Pca {
    mean: Array1<f64>,
    /// `(n_components, n_features)`, one direction per row.
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    total_variance: f64,
}

impl Pca {
    /// Fit `n_components` principal directions of `x` (rows are samples).
    pub fn fit(x: &Array2<f64>, n_components: usize) -> Result<Self> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 || ncols == 0 {
            return Err(PipelineError::EmptyInput("PCA needs a non-empty matrix"));
        }
        if n_components == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_components must be positive".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(PipelineError::EmptyInput("PCA needs at least one sample"))?;
        let centered = x - &mean;
        let dof = nrows.saturating_sub(1).max(1) as f64;

        let use_gram = ncols > nrows;
        let scatter = if use_gram {
            centered.dot(&centered.t())
        } else {
            centered.t().dot(&centered)
        };
        let (eigenvalues, eigenvectors) = sorted_eigen(&scatter);

        let largest = eigenvalues.first().copied().unwrap_or(0.0).max(0.0);
        let cutoff = largest * (nrows.max(ncols) as f64) * f64::EPSILON;
        let total_variance = eigenvalues.iter().map(|&v| v.max(0.0)).sum::<f64>() / dof;

        let mut components = Array2::<f64>::zeros((n_components, ncols));
        let mut explained_variance = Array1::<f64>::zeros(n_components);

        for k in 0..n_components.min(eigenvalues.len()) {
            let lambda = eigenvalues[k];
            if lambda.is_nan() || lambda <= cutoff {
                break;
            }

            let mut direction = if use_gram {
                // v = Xc^T u / ||Xc^T u||
                centered.t().dot(&eigenvectors.column(k))
            } else {
                eigenvectors.column(k).to_owned()
            };
            let norm = direction.dot(&direction).sqrt();
            if norm == 0.0 || !norm.is_finite() {
                break;
            }
            direction /= norm;
            flip_sign(&mut direction);

            components.row_mut(k).assign(&direction);
            explained_variance[k] = lambda / dof;
        }

        log::trace!(
            "PCA fit on {} x {} ({} path): {} non-zero components",
            nrows,
            ncols,
            if use_gram { "gram" } else { "covariance" },
            explained_variance.iter().filter(|&&v| v > 0.0).count()
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    /// Project rows of `x` onto the fitted directions.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        let centered = x - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.components.ncols()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        if self.total_variance > 0.0 {
            &self.explained_variance / self.total_variance
        } else {
            Array1::zeros(self.explained_variance.len())
        }
    }
}

/// Eigen-decompose a symmetric matrix; eigenvalues descending, eigenvectors
/// as matching columns.
fn sorted_eigen(matrix: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let dm = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]);
    let eig = SymmetricEigen::new(dm);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let values = order.iter().map(|&k| eig.eigenvalues[k]).collect();
    let vectors = Array2::from_shape_fn((n, n), |(i, k)| eig.eigenvectors[(i, order[k])]);
    (values, vectors)
}

/// Make the largest-magnitude loading positive so the output does not depend
/// on the solver's sign choice.
fn flip_sign(direction: &mut Array1<f64>) {
    let pivot = direction
        .iter()
        .copied()
        .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
    if pivot < 0.0 {
        direction.mapv_inplace(|v| -v);
    }
}
