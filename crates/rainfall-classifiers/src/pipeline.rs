//! Feature extractor followed by a classifier.

use ndarray::Array2;

use crate::config::PipelineConfig;
use crate::data_handling::{GridDataset, GridFields};
use crate::error::Result;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;

pub struct Pipeline {
    extractor: FeatureExtractor,
    classifier: Box<dyn ClassifierModel>,
}

impl Pipeline {
    pub fn new(extractor: FeatureExtractor, classifier: Box<dyn ClassifierModel>) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            FeatureExtractor::new(config.extractor.clone()),
            build_model(config.model.clone()),
        ))
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &dyn ClassifierModel {
        self.classifier.as_ref()
    }

    /// Fit the extractor, transform the training fields and fit the
    /// classifier on the resulting rows.
    ///
    /// A failed fit leaves the pipeline as it was.
    pub fn fit(&mut self, dataset: &GridDataset) -> Result<()> {
        dataset.log_input_data_summary();

        let labels = dataset.labels.to_vec();
        let mut extractor = FeatureExtractor::new(self.extractor.config().clone());
        let features = extractor.fit_transform(&dataset.fields, &labels)?;
        log::info!(
            "Extracted {} features per sample from {} variables",
            features.ncols(),
            extractor.variables().len()
        );

        self.classifier.fit(&features, &labels)?;
        self.extractor = extractor;
        log::info!("Fitted {} classifier", self.classifier.name());
        Ok(())
    }

    /// `(n_samples, 2)` class probabilities for new fields.
    pub fn predict_proba(&self, fields: &GridFields) -> Result<Array2<f64>> {
        let features = self.extractor.transform(fields)?;
        self.classifier.predict_proba(&features)
    }
}
