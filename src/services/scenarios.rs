use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use serde::Serialize;

use crate::calibration::{CalibrationValidator, MatchPrediction, RatingCalibrator};
use crate::config::EngineConfig;
use crate::domain::{ContestContext, ContestResult, Contestant, Round, Surface, Tier};
use crate::registry::ProfileRegistry;

const SPARRING_PARTNER: &str = "sparring-partner";

/// One fixture to evaluate inside a scenario
#[derive(Debug, Clone)]
pub struct Matchup {
    pub player1: Contestant,
    pub player2: Contestant,
    pub context: ContestContext,
}

impl Matchup {
    fn new(player1: (&str, i32), player2: (&str, i32), context: ContestContext) -> Self {
        Self {
            player1: Contestant::new(player1.0, Some(player1.1)),
            player2: Contestant::new(player2.0, Some(player2.1)),
            context,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub expected_behavior: &'static str,
    pub matchups: Vec<Matchup>,
    /// The first two matchups are the same pairing from both sides
    pub mirrored: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub expected_behavior: &'static str,
    pub predictions: Vec<MatchPrediction>,
    pub mean: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub consistency_gap: Option<f64>,
}

impl ScenarioResult {
    fn from_predictions(scenario: &Scenario, predictions: Vec<MatchPrediction>) -> Self {
        let probabilities: Vec<f64> = predictions.iter().map(|p| p.probability).collect();
        let n = probabilities.len().max(1) as f64;
        let mean = probabilities.iter().sum::<f64>() / n;
        let variance = probabilities.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let min = probabilities.iter().copied().fold(f64::INFINITY, f64::min);
        let max = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let consistency_gap = match (scenario.mirrored, probabilities.as_slice()) {
            (true, [forward, reverse, ..]) => {
                Some(CalibrationValidator::consistency_check(*forward, *reverse))
            }
            _ => None,
        };

        Self {
            name: scenario.name,
            expected_behavior: scenario.expected_behavior,
            predictions,
            mean,
            variance,
            min,
            max,
            consistency_gap,
        }
    }

    /// Mean away from the extremes and predictions that actually move
    pub fn is_reasonably_calibrated(&self) -> bool {
        (0.1..=0.9).contains(&self.mean) && self.variance > 0.001
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub results: Vec<ScenarioResult>,
}

impl ScenarioReport {
    pub fn calibrated_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.is_reasonably_calibrated())
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n", "Calibration scenarios".bold());

        for result in &self.results {
            let status = if result.is_reasonably_calibrated() {
                "ok".green()
            } else {
                "check".yellow()
            };
            out.push_str(&format!(
                "\n[{}] {}\n  expected: {}\n  mean {:.3}, min {:.3}, max {:.3}, variance {:.4}\n",
                status,
                result.name.bold(),
                result.expected_behavior.dimmed(),
                result.mean,
                result.min,
                result.max,
                result.variance
            ));
            if let Some(gap) = result.consistency_gap {
                out.push_str(&format!("  consistency gap {:.4}\n", gap));
            }
            for prediction in &result.predictions {
                out.push_str(&format!("    {}\n", prediction));
            }
        }

        out.push_str(&format!(
            "\n{}/{} scenarios reasonably calibrated\n",
            self.calibrated_count(),
            self.results.len()
        ));
        out
    }
}

type ScenarioBuilder = fn(&ScenarioService, &mut ProfileRegistry) -> Result<Scenario>;

/// Fixed sanity scenarios run against simulated histories
pub struct ScenarioService {
    config: EngineConfig,
    calibrator: RatingCalibrator,
}

impl ScenarioService {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calibrator: RatingCalibrator::new(&config),
            config,
        }
    }

    pub fn run(&self) -> Result<ScenarioReport> {
        info!("=== Running Calibration Scenarios ===\n");

        let builders: [ScenarioBuilder; 5] = [
            Self::ranking_sensitivity,
            Self::surface_impact,
            Self::head_to_head_consistency,
            Self::form_factor,
            Self::tournament_context,
        ];

        let mut registry = ProfileRegistry::new(self.config.profile);
        let mut results = Vec::with_capacity(builders.len());

        for build in builders {
            registry.reset();
            let scenario = build(self, &mut registry)?;
            let result = self.evaluate(&registry, &scenario);
            info!(
                "  → {}: mean {:.3}, variance {:.4}",
                result.name, result.mean, result.variance
            );
            results.push(result);
        }

        info!("=== Scenarios Complete ===");
        Ok(ScenarioReport { results })
    }

    fn evaluate(&self, registry: &ProfileRegistry, scenario: &Scenario) -> ScenarioResult {
        let predictions = scenario
            .matchups
            .iter()
            .map(|m| {
                self.calibrator
                    .predict(registry, &m.player1, &m.player2, &m.context)
            })
            .collect();
        ScenarioResult::from_predictions(scenario, predictions)
    }

    fn ranking_sensitivity(&self, _registry: &mut ProfileRegistry) -> Result<Scenario> {
        let slam = |round| ContestContext::new(Surface::Hard).with_tier(Tier::GrandSlam).with_round(round);

        Ok(Scenario {
            name: "Ranking sensitivity",
            expected_behavior: "Bigger ranking gaps give more lopsided probabilities",
            matchups: vec![
                Matchup::new(("P1", 1), ("P150", 150), slam(Round::R128)),
                Matchup::new(("P1", 1), ("P100", 100), slam(Round::R64)),
                Matchup::new(("P1", 1), ("P50", 50), slam(Round::R32)),
                Matchup::new(
                    ("P5", 5),
                    ("P50", 50),
                    ContestContext::new(Surface::Hard)
                        .with_tier(Tier::Masters)
                        .with_round(Round::R16),
                ),
                Matchup::new(
                    ("P10", 10),
                    ("P30", 30),
                    ContestContext::new(Surface::Hard)
                        .with_tier(Tier::Atp250)
                        .with_round(Round::QuarterFinal),
                ),
            ],
            mirrored: false,
        })
    }

    fn surface_impact(&self, registry: &mut ProfileRegistry) -> Result<Scenario> {
        self.simulate(registry, "CLAY5", Surface::Clay, 20, 0.75)?;
        self.simulate(registry, "CLAY5", Surface::Hard, 15, 0.55)?;
        self.simulate(registry, "GRASS5", Surface::Grass, 15, 0.8)?;
        self.simulate(registry, "GRASS5", Surface::Hard, 20, 0.6)?;
        self.simulate(registry, "P15", Surface::Hard, 20, 0.5)?;

        let slam_qf = |surface| {
            ContestContext::new(surface)
                .with_tier(Tier::GrandSlam)
                .with_round(Round::QuarterFinal)
        };

        Ok(Scenario {
            name: "Surface impact",
            expected_behavior: "Specialists gain on their surface relative to hard courts",
            matchups: vec![
                Matchup::new(("P5", 5), ("P15", 15), slam_qf(Surface::Hard)),
                Matchup::new(("P5", 5), ("P15", 15), slam_qf(Surface::Clay)),
                Matchup::new(("P5", 5), ("P15", 15), slam_qf(Surface::Grass)),
                Matchup::new(("CLAY5", 5), ("P15", 15), slam_qf(Surface::Clay)),
                Matchup::new(("CLAY5", 5), ("P15", 15), slam_qf(Surface::Hard)),
                Matchup::new(("GRASS5", 5), ("P15", 15), slam_qf(Surface::Grass)),
            ],
            mirrored: false,
        })
    }

    fn head_to_head_consistency(&self, registry: &mut ProfileRegistry) -> Result<Scenario> {
        let meeting = |winner: &str, loser: &str| {
            ContestResult::new(winner, loser, Surface::Hard, None)
                .with_tier(Tier::Masters)
                .with_ranks(Some(rank_of(winner)), Some(rank_of(loser)))
        };
        for result in [
            meeting("P10", "P12"),
            meeting("P10", "P12"),
            meeting("P12", "P10"),
            meeting("P10", "P12"),
        ] {
            self.apply(registry, &result)?;
        }

        let semi = ContestContext::new(Surface::Hard)
            .with_tier(Tier::Masters)
            .with_round(Round::SemiFinal);

        Ok(Scenario {
            name: "Head-to-head consistency",
            expected_behavior: "P(A beats B) and P(B beats A) sum to one",
            matchups: vec![
                Matchup::new(("P10", 10), ("P12", 12), semi),
                Matchup::new(("P12", 12), ("P10", 10), semi),
            ],
            mirrored: true,
        })
    }

    fn form_factor(&self, registry: &mut ProfileRegistry) -> Result<Scenario> {
        self.simulate(registry, "P20", Surface::Hard, 10, 0.8)?;
        self.simulate(registry, "P25", Surface::Hard, 10, 0.3)?;

        let r32 = ContestContext::new(Surface::Hard)
            .with_tier(Tier::Masters)
            .with_round(Round::R32);

        Ok(Scenario {
            name: "Form factor",
            expected_behavior: "A hot player beats a cold one more often than rankings suggest",
            matchups: vec![
                Matchup::new(("P20", 20), ("P25", 25), r32),
                Matchup::new(("P25", 25), ("P20", 20), r32),
            ],
            mirrored: true,
        })
    }

    fn tournament_context(&self, _registry: &mut ProfileRegistry) -> Result<Scenario> {
        let fixture = |tier, round| {
            Matchup::new(
                ("P8", 8),
                ("P15", 15),
                ContestContext::new(Surface::Hard).with_tier(tier).with_round(round),
            )
        };

        Ok(Scenario {
            name: "Tournament context",
            expected_behavior: "Grand Slams and finals favour the stronger player",
            matchups: vec![
                fixture(Tier::GrandSlam, Round::Final),
                fixture(Tier::Masters, Round::Final),
                fixture(Tier::Atp250, Round::Final),
                fixture(Tier::GrandSlam, Round::R32),
            ],
            mirrored: false,
        })
    }

    /// Feed `matches` results against a sparring partner, winning a
    /// `win_rate` share spread evenly through the run
    fn simulate(
        &self,
        registry: &mut ProfileRegistry,
        player: &str,
        surface: Surface,
        matches: u32,
        win_rate: f64,
    ) -> Result<()> {
        for i in 0..matches {
            let won = (f64::from(i + 1) * win_rate).floor() > (f64::from(i) * win_rate).floor();
            let result = if won {
                ContestResult::new(player, SPARRING_PARTNER, surface, None)
            } else {
                ContestResult::new(SPARRING_PARTNER, player, surface, None)
            };
            self.apply(registry, &result)?;
        }
        Ok(())
    }

    fn apply(&self, registry: &mut ProfileRegistry, result: &ContestResult) -> Result<()> {
        registry
            .ingest(result)
            .with_context(|| format!("Failed to simulate {} vs {}", result.winner_id, result.loser_id))?;
        self.calibrator.update_ratings(registry, result)?;
        Ok(())
    }
}

/// "P12" -> 12
fn rank_of(id: &str) -> i32 {
    id.trim_start_matches('P').parse().unwrap_or(0)
}
