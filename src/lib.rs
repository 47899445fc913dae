pub mod calibration;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod rating;
pub mod registry;
pub mod services;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::info;

use crate::cli::Command;
use crate::config::EngineConfig;
use crate::domain::ContestResult;
use crate::errors::{load_context, with_parse_context};
use crate::services::{BacktestService, ScenarioService};

pub use crate::calibration::{CalibrationValidator, MatchPrediction, RatingCalibrator};
pub use crate::registry::{ProfileRegistry, SharedRegistry};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_scenarios(config: Option<&Path>) -> Result<()> {
    let config = EngineConfig::load_or_default(config)?;
    let report = ScenarioService::new(config).run()?;
    println!("{}", report.render());
    Ok(())
}

pub fn handle_backtest(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = EngineConfig::load_or_default(config)?;
    let results = load_results(input)?;
    info!("Loaded {} results from {}", results.len(), input.display());

    let report = BacktestService::new(config).run(&results)?;
    println!("{}", report);
    Ok(())
}

/// Read a JSON array of contest results
pub fn load_results(path: &Path) -> Result<Vec<ContestResult>> {
    let json = fs::read_to_string(path).with_context(|| load_context(path))?;
    with_parse_context(serde_json::from_str(&json), "contest results")
}
