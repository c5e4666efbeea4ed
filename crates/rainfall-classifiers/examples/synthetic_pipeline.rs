use rainfall_classifiers::config::PipelineConfig;
use rainfall_classifiers::pipeline::Pipeline;
use rainfall_classifiers::synthetic::{generate, SyntheticConfig};

fn main() -> rainfall_classifiers::Result<()> {
    env_logger::init();

    // 4 members x 25 years on a 4 x 4 grid, 30% of winters above the threshold
    let train = generate(&SyntheticConfig::default())?;
    let test = generate(&SyntheticConfig {
        seed: 43,
        ..SyntheticConfig::default()
    })?;

    let mut pipeline = Pipeline::from_config(&PipelineConfig::default())?;
    pipeline.fit(&train)?;

    let proba = pipeline.predict_proba(&test.fields)?;
    println!("Test probabilities shape: {:?}", proba.dim());

    let mean_for = |label: u8| {
        let rows: Vec<f64> = (0..test.n_samples())
            .filter(|&i| test.labels[i] == label)
            .map(|i| proba[[i, 1]])
            .collect();
        rows.iter().sum::<f64>() / rows.len().max(1) as f64
    };
    println!(
        "Mean P(exceed) for wet winters {:.3}, for dry winters {:.3}",
        mean_for(1),
        mean_for(0)
    );
    Ok(())
}
