use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use rainfall_classifiers::config::Penalty;
use rainfall_cli::predict::{
    load_run_config, parse_grid, run_synthetic, set_penalty, write_predictions, RunConfig,
};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("RAINFALL_LOG", "error,rainfall=info"))
        .init();

    let matches = Command::new("rainfall")
        .version(clap::crate_version!())
        .about("Extreme-rainfall classification from gridded climate ensembles")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("config")
                .about("Print the default run configuration as JSON")
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Write the configuration to this file instead of stdout")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("synthetic")
                .about("Fit the pipeline on synthetic ensemble data and predict a held-out set")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON run configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("members")
                        .long("members")
                        .help("Number of ensemble members. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("years")
                        .long("years")
                        .help("Years per ensemble member. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("grid")
                        .long("grid")
                        .help("Grid size as LATxLON, e.g. 4x4")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("positive_rate")
                        .long("positive-rate")
                        .help("Fraction of samples labeled as extreme rainfall")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed of the training set; the test set uses seed + 1")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("penalty")
                        .long("penalty")
                        .help("Override the penalty of the logistic model")
                        .value_parser(["l1", "l2"]),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write per-sample predictions (CSV). Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("config", sub_m)) => handle_config(sub_m),
        Some(("synthetic", sub_m)) => handle_synthetic(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_config(matches: &ArgMatches) -> Result<()> {
    let json = serde_json::to_string_pretty(&RunConfig::default())?;
    match matches.get_one::<PathBuf>("output_file") {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write config: {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_synthetic(matches: &ArgMatches) -> Result<()> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[Rainfall] Using config: {:?}", path);
            load_run_config(path)?
        }
        None => {
            log::info!("[Rainfall] No config provided; using defaults.");
            RunConfig::default()
        }
    };

    if let Some(&members) = matches.get_one::<usize>("members") {
        config.synthetic.n_members = members;
    }
    if let Some(&years) = matches.get_one::<usize>("years") {
        config.synthetic.years_per_member = years;
    }
    if let Some(grid) = matches.get_one::<String>("grid") {
        config.synthetic.grid = parse_grid(grid)?;
    }
    if let Some(&rate) = matches.get_one::<f64>("positive_rate") {
        config.synthetic.positive_rate = rate;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.synthetic.seed = seed;
    }
    if let Some(penalty) = matches.get_one::<String>("penalty") {
        let penalty = match penalty.as_str() {
            "l2" => Penalty::L2,
            _ => Penalty::L1,
        };
        set_penalty(&mut config, penalty);
    }

    let result = match run_synthetic(&config) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Synthetic run failed: {:#}", e);
            std::process::exit(1)
        }
    };

    write_predictions(&result, matches.get_one::<PathBuf>("output_file").map(|p| p.as_path()))?;

    let mean_wet = result.mean_positive_probability(1).unwrap_or(f64::NAN);
    let mean_dry = result.mean_positive_probability(0).unwrap_or(f64::NAN);
    log::info!(
        "[Rainfall] Predicted {} samples; mean P(extreme) {:.3} on extreme, {:.3} on other samples",
        result.samples.len(),
        mean_wet,
        mean_dry
    );
    Ok(())
}
