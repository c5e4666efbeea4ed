//! Turns multi-variable gridded fields into fixed-width feature rows.
//!
//! For every configured variable the extractor learns a grid-point
//! normalization and a PCA basis on the training samples. `transform`
//! projects each sample onto those bases and concatenates the per-variable
//! scores in configured-variable order.

use ndarray::{s, Array2};

use crate::config::ExtractorConfig;
use crate::data_handling::GridFields;
use crate::decomposition::Pca;
use crate::error::{PipelineError, Result};
use crate::preprocessing::{fit_transform_flat, GridScaler};

/// Fitted state for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableModel {
    pub variable: String,
    pub scaler: GridScaler,
    pub pca: Pca,
}

impl VariableModel {
    fn transform(&self, fields: &GridFields) -> Result<Array2<f64>> {
        let values = fields.get(&self.variable)?;
        let flat = self.scaler.transform_flat(values)?;
        self.pca.transform(&flat)
    }
}

/// Grid-normalizing PCA feature extractor.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
    models: Option<Vec<VariableModel>>,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            models: None,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn variables(&self) -> &[String] {
        &self.config.variables
    }

    /// Width of the rows produced by `transform`.
    pub fn n_features_out(&self) -> usize {
        self.config.n_components * self.config.variables.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.models.is_some()
    }

    /// Fitted state of one variable, if fitted.
    pub fn variable_model(&self, variable: &str) -> Option<&VariableModel> {
        self.models
            .as_ref()?
            .iter()
            .find(|m| m.variable == variable)
    }

    /// Learn normalization statistics and PCA bases from training fields.
    ///
    /// `labels` are not used for the extraction itself; only their count is
    /// checked against the number of samples.
    pub fn fit(&mut self, fields: &GridFields, labels: &[u8]) -> Result<()> {
        self.config.validate()?;

        let nrows = fields.n_samples();
        if labels.len() != nrows {
            return Err(PipelineError::LengthMismatch {
                what: "labels",
                expected: nrows,
                got: labels.len(),
            });
        }

        let mut models = Vec::with_capacity(self.config.variables.len());
        for variable in &self.config.variables {
            let values = fields.get(variable)?;
            let (scaler, flat) = fit_transform_flat(variable, values)?;
            let pca = Pca::fit(&flat, self.config.n_components)?;

            let (n_lat, n_lon) = scaler.grid_shape();
            log::debug!(
                "Fitted {} on {} samples ({} x {} grid): {:.1}% variance in {} components",
                variable,
                nrows,
                n_lat,
                n_lon,
                pca.explained_variance_ratio().sum() * 100.0,
                self.config.n_components
            );

            models.push(VariableModel {
                variable: variable.clone(),
                scaler,
                pca,
            });
        }

        self.models = Some(models);
        Ok(())
    }

    /// Feature matrix of shape `(n_samples, n_components * n_variables)`.
    pub fn transform(&self, fields: &GridFields) -> Result<Array2<f64>> {
        let models = self
            .models
            .as_ref()
            .ok_or(PipelineError::NotFitted("FeatureExtractor"))?;

        let k = self.config.n_components;
        let mut features = Array2::<f64>::zeros((fields.n_samples(), k * models.len()));
        for (idx, model) in models.iter().enumerate() {
            let reduced = model.transform(fields)?;
            features
                .slice_mut(s![.., idx * k..(idx + 1) * k])
                .assign(&reduced);
        }
        Ok(features)
    }

    pub fn fit_transform(&mut self, fields: &GridFields, labels: &[u8]) -> Result<Array2<f64>> {
        self.fit(fields, labels)?;
        self.transform(fields)
    }
}
