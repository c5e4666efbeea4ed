//! Grid-point normalization of gridded fields.
//!
//! Each grid point is standardized with its own mean and standard deviation
//! over the training samples, so high-variance regions (e.g. the poles) do
//! not dominate the principal components computed afterwards. The
//! normalized grids are flattened row-major into one feature row per sample.

use ndarray::{s, Array2, Array3};

use crate::error::{PipelineError, Result};

/// Grid-shaped mean/std standardization for one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct GridScaler {
    pub variable: String,
    /// `(lat, lon)` mean over training samples. NaN where no finite value was seen.
    pub mean: Array2<f64>,
    /// `(lat, lon)` population standard deviation; never zero.
    pub std: Array2<f64>,
}

impl GridScaler {
    pub fn grid_shape(&self) -> (usize, usize) {
        self.mean.dim()
    }

    /// Normalize and flatten `(sample, lat, lon)` values into
    /// `(sample, lat * lon)`. Non-finite results are replaced by zero.
    pub fn transform_flat(&self, values: &Array3<f64>) -> Result<Array2<f64>> {
        let (nrows, n_lat, n_lon) = values.dim();
        if (n_lat, n_lon) != self.grid_shape() {
            return Err(PipelineError::GridShapeMismatch {
                variable: self.variable.clone(),
                expected: self.grid_shape(),
                got: (n_lat, n_lon),
            });
        }

        let mut out = Vec::with_capacity(nrows * n_lat * n_lon);
        for r in 0..nrows {
            for i in 0..n_lat {
                for j in 0..n_lon {
                    let v = (values[[r, i, j]] - self.mean[[i, j]]) / self.std[[i, j]];
                    out.push(if v.is_finite() { v } else { 0.0 });
                }
            }
        }

        Array2::from_shape_vec((nrows, n_lat * n_lon), out).map_err(|_| {
            PipelineError::DimensionMismatch {
                expected: nrows * n_lat * n_lon,
                got: values.len(),
            }
        })
    }
}

/// Fit a `GridScaler` from `(sample, lat, lon)` training values.
///
/// NaN and infinite values are skipped per grid point. A grid point whose values are all
/// identical, or that has no spread at all, gets a standard deviation of 1.
pub fn fit_grid_scaler(variable: &str, values: &Array3<f64>) -> Result<GridScaler> {
    let (nrows, n_lat, n_lon) = values.dim();
    if nrows == 0 {
        return Err(PipelineError::EmptyInput("grid scaler needs at least one sample"));
    }
    if n_lat == 0 || n_lon == 0 {
        return Err(PipelineError::EmptyInput("grid scaler needs a non-empty grid"));
    }

    let mut mean = Array2::<f64>::zeros((n_lat, n_lon));
    let mut std = Array2::<f64>::ones((n_lat, n_lon));

    for i in 0..n_lat {
        for j in 0..n_lon {
            let column = values.slice(s![.., i, j]);
            let mut count = 0usize;
            let mut sum = 0.0;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &v in column.iter().filter(|v| v.is_finite()) {
                count += 1;
                sum += v;
                min = min.min(v);
                max = max.max(v);
            }

            if count == 0 {
                mean[[i, j]] = f64::NAN;
                continue;
            }
            if min == max {
                // constant point: keep the exact value so it normalizes to 0
                mean[[i, j]] = min;
                continue;
            }

            let m = sum / count as f64;
            let var = column
                .iter()
                .filter(|v| v.is_finite())
                .map(|&v| (v - m) * (v - m))
                .sum::<f64>()
                / count as f64;
            let sd = var.sqrt();

            mean[[i, j]] = m;
            if sd > 0.0 && sd.is_finite() {
                std[[i, j]] = sd;
            }
        }
    }

    Ok(GridScaler {
        variable: variable.to_string(),
        mean,
        std,
    })
}

/// Fit a scaler and return the normalized, flattened training matrix.
pub fn fit_transform_flat(variable: &str, values: &Array3<f64>) -> Result<(GridScaler, Array2<f64>)> {
    let scaler = fit_grid_scaler(variable, values)?;
    let flat = scaler.transform_flat(values)?;
    Ok((scaler, flat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_grid_scaler_per_point() {
        // 3 samples on a 1 x 2 grid
        let values = Array3::from_shape_vec((3, 1, 2), vec![1.0, 10.0, 2.0, 10.0, 3.0, 10.0]).unwrap();
        let sc = fit_grid_scaler("TS", &values).unwrap();
        assert!((sc.mean[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((sc.std[[0, 0]] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(sc.mean[[0, 1]], 10.0);
        assert_eq!(sc.std[[0, 1]], 1.0);
    }

    #[test]
    fn test_nan_is_skipped_and_zero_filled() {
        let values = Array3::from_shape_vec((3, 1, 1), vec![1.0, f64::NAN, 3.0]).unwrap();
        let (sc, flat) = fit_transform_flat("PSL", &values).unwrap();
        assert!((sc.mean[[0, 0]] - 2.0).abs() < 1e-12);
        assert_eq!(flat.dim(), (3, 1));
        assert_eq!(flat[[1, 0]], 0.0);
        assert!((flat[[0, 0]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_other_grid() {
        let sc = fit_grid_scaler("TMQ", &Array3::zeros((2, 2, 3))).unwrap();
        let err = sc.transform_flat(&Array3::zeros((2, 3, 2))).unwrap_err();
        assert!(matches!(err, PipelineError::GridShapeMismatch { .. }));
    }
}
