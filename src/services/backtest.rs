use std::fmt;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::calibration::{CalibrationMetrics, CalibrationValidator, RatingCalibrator};
use crate::config::EngineConfig;
use crate::domain::{ContestDate, ContestResult, Contestant};
use crate::registry::ProfileRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub total_results: usize,
    pub warmup_results: usize,
    pub scored: usize,
    pub rejected: usize,
    pub out_of_order: usize,
    pub metrics: Option<CalibrationMetrics>,
    pub mean_consistency_gap: Option<f64>,
}

impl fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Backtest: {} results ({} warm-up, {} scored, {} rejected, {} out of order)",
            self.total_results, self.warmup_results, self.scored, self.rejected, self.out_of_order
        )?;
        match &self.metrics {
            Some(metrics) => write!(f, "  {}", metrics)?,
            None => write!(f, "  nothing to score")?,
        }
        if let Some(gap) = self.mean_consistency_gap {
            write!(f, "\n  mean consistency gap {:.4}", gap)?;
        }
        Ok(())
    }
}

/// Chronological replay: every scored contest is predicted from what was
/// known before it, then revealed to the registry.
pub struct BacktestService {
    config: EngineConfig,
    calibrator: RatingCalibrator,
    validator: CalibrationValidator,
}

impl BacktestService {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calibrator: RatingCalibrator::new(&config),
            validator: CalibrationValidator::new(config.validation),
            config,
        }
    }

    pub fn run(&self, results: &[ContestResult]) -> Result<BacktestReport> {
        let mut registry = ProfileRegistry::new(self.config.profile);
        self.run_on(&mut registry, results)
    }

    /// Replays into `registry`, which is reset first
    pub fn run_on(
        &self,
        registry: &mut ProfileRegistry,
        results: &[ContestResult],
    ) -> Result<BacktestReport> {
        info!("=== Starting Backtest ===\n");
        registry.reset();

        let warmup = self.warmup_len(results.len());
        let out_of_order = count_out_of_order(results);
        info!("  → {} results, {} used as warm-up", results.len(), warmup);

        let (warm, scored) = results.split_at(warmup);
        let mut rejected = 0;

        for result in warm {
            if !self.reveal(registry, result)? {
                rejected += 1;
            }
        }
        info!(
            "  → Warm-up built {} profiles from {} contests\n",
            registry.competitor_count(),
            registry.contests_ingested()
        );

        let mut predictions = Vec::with_capacity(scored.len());
        let mut outcomes = Vec::with_capacity(scored.len());
        let mut gaps = Vec::with_capacity(scored.len());

        for result in scored {
            if let Err(e) = result.validate() {
                warn!("Skipping result: {}", e);
                rejected += 1;
                continue;
            }

            let (player1, player2, player1_won) = orient(result);
            let context = result.context();
            let forward = self
                .calibrator
                .win_probability(registry, &player1, &player2, &context);
            let reverse = self
                .calibrator
                .win_probability(registry, &player2, &player1, &context);

            predictions.push(forward);
            outcomes.push(player1_won);
            gaps.push(CalibrationValidator::consistency_check(forward, reverse));

            self.reveal(registry, result)?;
        }
        info!("  → Scored {} predictions", predictions.len());

        let metrics = if predictions.is_empty() {
            None
        } else {
            let metrics = self
                .validator
                .evaluate(&predictions, &outcomes)
                .context("Failed to score backtest predictions")?;
            info!("  → {}", metrics);
            Some(metrics)
        };

        let report = BacktestReport {
            total_results: results.len(),
            warmup_results: warmup,
            scored: predictions.len(),
            rejected,
            out_of_order,
            metrics,
            mean_consistency_gap: mean(&gaps),
        };

        info!("=== Backtest Complete ===");
        Ok(report)
    }

    fn warmup_len(&self, total: usize) -> usize {
        let fraction = self.config.backtest.warmup_fraction.max(0.0).min(1.0);
        ((total as f64 * fraction).floor() as usize).min(total)
    }

    /// Ingest and, when enabled, rate a result. `false` if it was rejected.
    fn reveal(&self, registry: &mut ProfileRegistry, result: &ContestResult) -> Result<bool> {
        if let Err(e) = registry.ingest(result) {
            warn!("Skipping result: {}", e);
            return Ok(false);
        }
        if self.config.backtest.update_ratings {
            self.calibrator
                .update_ratings(registry, result)
                .with_context(|| {
                    format!(
                        "Failed to update ratings for {} vs {}",
                        result.winner_id, result.loser_id
                    )
                })?;
        }
        Ok(true)
    }
}

/// player1 is the lexicographically smaller id, so outcomes are not all wins
fn orient(result: &ContestResult) -> (Contestant, Contestant, bool) {
    let winner = Contestant::new(result.winner_id.clone(), result.winner_rank);
    let loser = Contestant::new(result.loser_id.clone(), result.loser_rank);
    if result.winner_id <= result.loser_id {
        (winner, loser, true)
    } else {
        (loser, winner, false)
    }
}

/// Results are replayed as given; dates going backwards are only reported
fn count_out_of_order(results: &[ContestResult]) -> usize {
    let mut latest: Option<ContestDate> = None;
    let mut count = 0;

    for result in results {
        let Some(date) = result.date else {
            continue;
        };
        match latest {
            Some(previous) if date < previous => {
                warn!(
                    "Result {} vs {} dated {} follows {}",
                    result.winner_id, result.loser_id, date, previous
                );
                count += 1;
            }
            _ => latest = Some(date),
        }
    }
    count
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
