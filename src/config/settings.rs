use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::load_context;

/// Bookkeeping and derived-metric parameters for a single competitor profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub max_history: usize,
    pub time_decay: f64,
    pub streak_decay: f64,
    pub reliability_matches: u32,
    pub initial_rating: f64,
    pub rating_floor: f64,
    pub rating_ceiling: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            max_history: 500,
            time_decay: 0.95,
            streak_decay: 0.8,
            reliability_matches: 50,
            initial_rating: 1500.0,
            rating_floor: 1000.0,
            rating_ceiling: 2500.0,
        }
    }
}

impl ProfileSettings {
    /// Per-surface logs keep half of the global history
    pub fn surface_history(&self) -> usize {
        self.max_history / 2
    }
}

/// Adaptive K-factor parameters for the post-result rating update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    pub k_factor_high_rank: f64,
    pub k_factor_low_rank: f64,
    pub high_rank_cutoff: i32,
    pub grand_slam_multiplier: f64,
    pub masters_multiplier: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor_high_rank: 20.0,
            k_factor_low_rank: 32.0,
            high_rank_cutoff: 50,
            grand_slam_multiplier: 1.2,
            masters_multiplier: 1.1,
        }
    }
}

/// Weights and bounds of the probability pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub default_rank: i32,
    pub rank_sensitivity: f64,
    pub surface_impact: f64,
    pub form_window: usize,
    pub form_weight_recent: f64,
    pub form_weight_surface: f64,
    pub form_scale: f64,
    pub form_max_adjustment: f64,
    pub h2h_full_reliability: u32,
    pub h2h_decay: f64,
    pub grand_slam_bias: f64,
    pub late_round_factor: f64,
    pub external_model_weight: f64,
    pub momentum_lookback: usize,
    pub probability_floor: f64,
    pub probability_ceiling: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            default_rank: 500,
            rank_sensitivity: 0.8,
            surface_impact: 0.15,
            form_window: 10,
            form_weight_recent: 0.7,
            form_weight_surface: 0.3,
            form_scale: 2.0,
            form_max_adjustment: 0.1,
            h2h_full_reliability: 10,
            h2h_decay: 0.95,
            grand_slam_bias: 0.02,
            late_round_factor: 0.1,
            external_model_weight: 0.5,
            momentum_lookback: 5,
            probability_floor: 0.05,
            probability_ceiling: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub bins: usize,
    pub log_loss_epsilon: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            bins: 10,
            log_loss_epsilon: 1e-15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Leading share of results ingested without being scored
    pub warmup_fraction: f64,
    pub update_ratings: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            warmup_fraction: 0.8,
            update_ratings: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub profile: ProfileSettings,
    pub rating: RatingSettings,
    pub calibration: CalibrationSettings,
    pub validation: ValidationSettings,
    pub backtest: BacktestSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (possibly partial) JSON config; missing fields keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).with_context(|| load_context(path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse engine config from {}", path.display()))
    }

    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "calibration": { "rank_sensitivity": 1.0 }, "backtest": { "warmup_fraction": 0.5 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.calibration.rank_sensitivity, 1.0);
        assert_eq!(config.calibration.default_rank, 500);
        assert_eq!(config.backtest.warmup_fraction, 0.5);
        assert!(config.backtest.update_ratings);
        assert_eq!(config.profile, ProfileSettings::default());
    }

    #[test]
    fn test_surface_history_is_half_of_global() {
        assert_eq!(ProfileSettings::default().surface_history(), 250);
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let err = EngineConfig::load("/nonexistent/court_rating.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/court_rating.json"));
    }
}
