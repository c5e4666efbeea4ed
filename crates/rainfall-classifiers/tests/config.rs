//! Integration tests for configuration types.

use rainfall_classifiers::config::{
    ExtractorConfig, ModelConfig, ModelType, Penalty, PipelineConfig, DEFAULT_N_COMPONENTS,
};

// ---------------------------------------------------------------------------
// ExtractorConfig
// ---------------------------------------------------------------------------

#[test]
fn extractor_config_defaults() {
    let cfg = ExtractorConfig::default();
    assert_eq!(cfg.variables, vec!["TS", "PSL", "TMQ"]);
    assert_eq!(cfg.n_components, DEFAULT_N_COMPONENTS);
    assert!(cfg.validate().is_ok());
}

#[test]
fn extractor_config_validation() {
    assert!(ExtractorConfig::new(vec![], 20).validate().is_err());
    assert!(ExtractorConfig::new(vec!["TS".into()], 0).validate().is_err());
    assert!(ExtractorConfig::new(vec!["TS".into(), "TS".into()], 20)
        .validate()
        .is_err());
}

// ---------------------------------------------------------------------------
// ModelType / ModelConfig
// ---------------------------------------------------------------------------

#[test]
fn model_type_default_is_sparse_logistic() {
    match ModelType::default() {
        ModelType::Logistic { penalty, c, .. } => {
            assert_eq!(penalty, Penalty::L1);
            assert!(c > 0.0 && c < 1.0);
        }
    }
}

#[test]
fn model_type_from_str() {
    let mt: ModelType = "logistic-l2".parse().unwrap();
    assert_eq!(mt.name(), "logistic-l2");
    let mt: ModelType = "Logistic".parse().unwrap();
    assert_eq!(mt.name(), "logistic-l1");
    let result: Result<ModelType, _> = "random_forest".parse();
    assert!(result.is_err());
}

#[test]
fn model_config_validation() {
    let bad = ModelConfig::new(ModelType::Logistic {
        penalty: Penalty::L1,
        c: -1.0,
        max_iter: 10,
        tol: 1e-4,
    });
    assert!(bad.validate().is_err());
    let bad = ModelConfig::new(ModelType::Logistic {
        penalty: Penalty::L1,
        c: 1.0,
        max_iter: 0,
        tol: 1e-4,
    });
    assert!(bad.validate().is_err());
    assert!(ModelConfig::default().validate().is_ok());
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[test]
fn pipeline_config_serializes_to_json() {
    let cfg = PipelineConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("n_components"));
    assert!(json.contains("Logistic"));
    assert!(json.contains("\"l1\""));
}

#[test]
fn pipeline_config_round_trips_json() {
    let cfg = PipelineConfig {
        extractor: ExtractorConfig::new(vec!["PSL".into(), "TS".into()], 8),
        model: ModelConfig::new("logistic-l2".parse().unwrap()),
    };
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    let back: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, back);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let cfg: PipelineConfig =
        serde_json::from_str(r#"{ "extractor": { "variables": ["TMQ"] } }"#).unwrap();
    assert_eq!(cfg.extractor.variables, vec!["TMQ"]);
    assert_eq!(cfg.extractor.n_components, DEFAULT_N_COMPONENTS);
    assert_eq!(cfg.model, ModelConfig::default());
}
