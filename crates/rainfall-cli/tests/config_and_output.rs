use rainfall_classifiers::config::{ModelType, Penalty};
use rainfall_cli::predict::{
    load_run_config, parse_grid, run_synthetic, set_penalty, write_predictions, RunConfig,
};

fn small_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.synthetic.n_members = 2;
    config.synthetic.years_per_member = 20;
    config.synthetic.grid = (3, 3);
    config.pipeline.extractor.n_components = 4;
    config
}

#[test]
fn test_default_config_round_trips_through_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let config = small_config();
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = load_run_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{"synthetic": {"seed": 7}}"#).unwrap();

    let loaded = load_run_config(&path).unwrap();
    assert_eq!(loaded.synthetic.seed, 7);
    assert_eq!(loaded.synthetic.n_members, 4);
    assert_eq!(loaded.pipeline, RunConfig::default().pipeline);
}

#[test]
fn test_missing_or_malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let err = load_run_config(&missing).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config"));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let err = load_run_config(&broken).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config"));
}

#[test]
fn test_parse_grid() {
    assert_eq!(parse_grid("4x4").unwrap(), (4, 4));
    assert_eq!(parse_grid("3X5").unwrap(), (3, 5));
    assert!(parse_grid("4").is_err());
    assert!(parse_grid("0x4").is_err());
    assert!(parse_grid("ax4").is_err());
}

#[test]
fn test_set_penalty_keeps_other_settings() {
    let mut config = small_config();
    set_penalty(&mut config, Penalty::L2);
    match config.pipeline.model.model_type {
        ModelType::Logistic { penalty, c, .. } => {
            assert_eq!(penalty, Penalty::L2);
            assert_eq!(c, 0.1);
        }
    }
}

#[test]
fn test_synthetic_run_writes_one_row_per_test_sample() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("predictions.csv");

    let result = run_synthetic(&small_config()).unwrap();
    assert_eq!(result.probabilities.dim(), (40, 2));
    for row in result.probabilities.rows() {
        assert!((row[0] + row[1] - 1.0).abs() < 1e-12);
    }

    write_predictions(&result, Some(&output)).unwrap();
    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["member", "year", "label", "p_negative", "p_positive"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 40);
    assert_eq!(&rows[0][0], "0");
    assert_eq!(&rows[0][1], "1920");
    assert_eq!(&rows[20][0], "1");
}

#[test]
fn test_invalid_run_config_fails_before_fitting() {
    let mut config = small_config();
    config.pipeline.extractor.n_components = 0;
    let err = run_synthetic(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("n_components"));
}
