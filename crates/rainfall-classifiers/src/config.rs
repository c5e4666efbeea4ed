use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Variables read from the November-mean climate model output.
pub const DEFAULT_VARIABLES: [&str; 3] = ["TS", "PSL", "TMQ"];

/// Number of principal components kept per variable.
pub const DEFAULT_N_COMPONENTS: usize = 20;

/// Settings for the gridded-field feature extractor.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Variables to extract, in output column order.
    pub variables: Vec<String>,
    /// Principal components kept per variable.
    pub n_components: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            n_components: DEFAULT_N_COMPONENTS,
        }
    }
}

impl ExtractorConfig {
    pub fn new(variables: Vec<String>, n_components: usize) -> Self {
        Self {
            variables,
            n_components,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.variables.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one variable must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for v in &self.variables {
            if !seen.insert(v.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "variable '{}' is listed more than once",
                    v
                )));
            }
        }
        if self.n_components == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_components must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Coefficient penalty of the logistic model.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    /// Lasso penalty; drives most coefficients to exactly zero.
    L1,
    /// Ridge penalty.
    L2,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    Logistic {
        penalty: Penalty,
        /// Inverse regularization strength; smaller values give sparser models.
        c: f64,
        max_iter: usize,
        tol: f64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Logistic {
            penalty: Penalty::L1,
            c: 0.1,
            max_iter: 5000,
            tol: 1e-6,
        }
    }
}

impl ModelType {
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelType::Logistic {
                c, max_iter, tol, ..
            } => {
                if !(c.is_finite() && *c > 0.0) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "c must be a positive finite number, got {}",
                        c
                    )));
                }
                if *max_iter == 0 {
                    return Err(PipelineError::InvalidConfig(
                        "max_iter must be positive".to_string(),
                    ));
                }
                if !(tol.is_finite() && *tol > 0.0) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "tol must be a positive finite number, got {}",
                        tol
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Logistic {
                penalty: Penalty::L1,
                ..
            } => "logistic-l1",
            ModelType::Logistic {
                penalty: Penalty::L2,
                ..
            } => "logistic-l2",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let penalty = match s.to_lowercase().as_str() {
            "logistic" | "logistic-l1" | "l1" => Penalty::L1,
            "logistic-l2" | "l2" => Penalty::L2,
            _ => {
                return Err(format!(
                    "Unknown model type: {}. Valid options are: logistic-l1, logistic-l2",
                    s
                ))
            }
        };
        match ModelType::default() {
            ModelType::Logistic {
                c, max_iter, tol, ..
            } => Ok(ModelType::Logistic {
                penalty,
                c,
                max_iter,
                tol,
            }),
        }
    }
}

/// Central configuration for the classifier stage.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub model_type: ModelType,
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self { model_type }
    }

    pub fn validate(&self) -> Result<()> {
        self.model_type.validate()
    }
}

/// Configuration of the full extractor + classifier pipeline.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub extractor: ExtractorConfig,
    pub model: ModelConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.model.validate()
    }
}
