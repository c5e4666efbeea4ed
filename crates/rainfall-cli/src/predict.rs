//! CLI helpers: run configuration, synthetic end-to-end runs and CSV output.
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use rainfall_classifiers::config::{ModelType, Penalty, PipelineConfig};
use rainfall_classifiers::data_handling::SampleId;
use rainfall_classifiers::pipeline::Pipeline;
use rainfall_classifiers::synthetic::{generate, SyntheticConfig};

/// Everything a synthetic run needs: the pipeline and the data generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub pipeline: PipelineConfig,
    pub synthetic: SyntheticConfig,
}

/// Per-sample probabilities for the test split.
#[derive(Debug)]
pub struct PredictionResult {
    pub samples: Vec<SampleId>,
    pub labels: Array1<u8>,
    /// `(n_samples, 2)`: P(label 0), P(label 1)
    pub probabilities: Array2<f64>,
}

impl PredictionResult {
    /// Mean P(label 1) over samples with the given label; `None` if there are none.
    pub fn mean_positive_probability(&self, label: u8) -> Option<f64> {
        let values: Vec<f64> = (0..self.labels.len())
            .filter(|&i| self.labels[i] == label)
            .map(|i| self.probabilities[[i, 1]])
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictionRow {
    member: usize,
    year: i32,
    label: u8,
    p_negative: f64,
    p_positive: f64,
}

/// Load a run configuration from a JSON file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: RunConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Parse a `LATxLON` grid size such as `4x4`.
pub fn parse_grid(s: &str) -> Result<(usize, usize)> {
    let (lat, lon) = s
        .to_lowercase()
        .split_once('x')
        .map(|(a, b)| (a.trim().to_string(), b.trim().to_string()))
        .with_context(|| format!("Grid must look like LATxLON, got '{}'", s))?;
    let lat: usize = lat
        .parse()
        .with_context(|| format!("Invalid latitude count in grid '{}'", s))?;
    let lon: usize = lon
        .parse()
        .with_context(|| format!("Invalid longitude count in grid '{}'", s))?;
    if lat == 0 || lon == 0 {
        anyhow::bail!("Grid dimensions must be positive, got '{}'", s);
    }
    Ok((lat, lon))
}

/// Generate a training set and an independent test set (next seed), fit the
/// pipeline on the first and predict the second.
pub fn run_synthetic(config: &RunConfig) -> Result<PredictionResult> {
    let train = generate(&config.synthetic).context("Failed to generate training data")?;
    let test_config = SyntheticConfig {
        seed: config.synthetic.seed.wrapping_add(1),
        ..config.synthetic.clone()
    };
    let test = generate(&test_config).context("Failed to generate test data")?;

    let mut pipeline = Pipeline::from_config(&config.pipeline)?;
    pipeline.fit(&train).context("Failed to fit pipeline")?;
    let probabilities = pipeline
        .predict_proba(&test.fields)
        .context("Failed to predict test data")?;

    Ok(PredictionResult {
        samples: test.samples,
        labels: test.labels,
        probabilities,
    })
}

/// Write predictions as CSV to `output`, or to stdout when `None`.
pub fn write_predictions(result: &PredictionResult, output: Option<&Path>) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output: {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let mut writer = csv::Writer::from_writer(sink);
    for (i, sample) in result.samples.iter().enumerate() {
        writer.serialize(PredictionRow {
            member: sample.member,
            year: sample.year,
            label: result.labels[i],
            p_negative: result.probabilities[[i, 0]],
            p_positive: result.probabilities[[i, 1]],
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Replace the penalty of the configured model, keeping its other settings.
pub fn set_penalty(config: &mut RunConfig, penalty: Penalty) {
    match &mut config.pipeline.model.model_type {
        ModelType::Logistic { penalty: p, .. } => *p = penalty,
    }
}
