use log::{debug, warn};

use super::prediction::{MatchPrediction, StageBreakdown};
use crate::config::{CalibrationSettings, EngineConfig, RatingSettings};
use crate::domain::{ContestContext, ContestResult, Contestant, Surface, Tier};
use crate::errors::EngineError;
use crate::rating::{CompetitorProfile, ConfidenceLevel, PairTally, RatingChange, elo};
use crate::registry::ProfileRegistry;

type ProfilePair<'a> = (&'a CompetitorProfile, &'a CompetitorProfile);

/// Turns rankings, surface ratings, form, head-to-head and tournament context
/// into a calibrated win probability, and moves surface ratings after results.
///
/// Stages run in a fixed order; each is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct RatingCalibrator {
    calibration: CalibrationSettings,
    rating: RatingSettings,
}

impl RatingCalibrator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            calibration: config.calibration,
            rating: config.rating,
        }
    }

    /// Probability that `player1` beats `player2`, within the configured bounds
    pub fn win_probability(
        &self,
        registry: &ProfileRegistry,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
    ) -> f64 {
        self.run_pipeline(registry, player1, player2, context, None)
            .final_probability()
    }

    pub fn predict(
        &self,
        registry: &ProfileRegistry,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
    ) -> MatchPrediction {
        self.build_prediction(registry, player1, player2, context, None)
    }

    /// Same as [`predict`](Self::predict), blending in an external model's estimate
    pub fn predict_with_model(
        &self,
        registry: &ProfileRegistry,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
        model_probability: f64,
    ) -> MatchPrediction {
        self.build_prediction(registry, player1, player2, context, Some(model_probability))
    }

    pub fn ranking_prior(&self, rank1: Option<i32>, rank2: Option<i32>) -> f64 {
        let r1 = elo::effective_rank(rank1, self.calibration.default_rank) as f64;
        let r2 = elo::effective_rank(rank2, self.calibration.default_rank) as f64;
        let diff = (r2.ln() - r1.ln()) * self.calibration.rank_sensitivity;
        sigmoid(diff)
    }

    /// Blend in the surface-rating expectation, weighted by how surface-specific results are
    pub fn apply_surface(&self, p: f64, profiles: Option<ProfilePair<'_>>, surface: Surface) -> f64 {
        let Some((first, second)) = profiles else {
            return p;
        };

        let elo_probability =
            elo::expected_score(first.surface_rating(surface), second.surface_rating(surface));
        let weight = surface.specialization_weight() * self.calibration.surface_impact;
        p * (1.0 - weight) + elo_probability * weight
    }

    pub fn apply_form(&self, p: f64, profiles: Option<ProfilePair<'_>>, surface: Surface) -> f64 {
        let Some((first, second)) = profiles else {
            return p;
        };

        let delta = self.blended_form(first, surface) - self.blended_form(second, surface);
        let adjustment =
            (delta * self.calibration.form_scale).tanh() * self.calibration.form_max_adjustment;
        self.clamp_probability(p + adjustment)
    }

    /// Shrink towards the head-to-head win rate. The weight is
    /// `min(1, n/10) * 0.95^n`, which peaks at ten meetings and then fades.
    pub fn apply_head_to_head(&self, p: f64, record: Option<&PairTally>) -> f64 {
        let Some(record) = record.filter(|r| !r.is_empty()) else {
            return p;
        };

        let meetings = record.total();
        let full = self.calibration.h2h_full_reliability.max(1) as f64;
        let reliability = (meetings as f64 / full).min(1.0);
        let weight = reliability * self.calibration.h2h_decay.powi(meetings as i32);
        p * (1.0 - weight) + record.win_rate() * weight
    }

    /// Tournament level and late-round adjustments, then the final clamp
    pub fn apply_context(&self, p: f64, context: &ContestContext) -> f64 {
        let level = match context.tier {
            Tier::GrandSlam => self.calibration.grand_slam_bias,
            Tier::Masters | Tier::Atp500 | Tier::Atp250 | Tier::Other => 0.0,
        };
        let round = match context.round {
            Some(r) if r.is_late_stage() => (p - 0.5) * self.calibration.late_round_factor,
            _ => 0.0,
        };
        self.clamp_probability(p + level + round)
    }

    /// `None` when the model value is unusable
    pub fn apply_external(&self, p: f64, model_probability: f64) -> Option<f64> {
        if !model_probability.is_finite() || !(0.0..=1.0).contains(&model_probability) {
            warn!("Ignoring external model probability {}", model_probability);
            return None;
        }
        let weight = self.calibration.external_model_weight.max(0.0).min(1.0);
        Some(self.clamp_probability(p * (1.0 - weight) + model_probability * weight))
    }

    /// Move both players' surface ratings after a finished contest.
    ///
    /// Returns `Ok(None)` without touching anything when either player has no
    /// profile yet (ingest the result first).
    pub fn update_ratings(
        &self,
        registry: &mut ProfileRegistry,
        result: &ContestResult,
    ) -> Result<Option<RatingChange>, EngineError> {
        result.validate()?;
        let surface = result.surface;

        let ratings = (
            registry.profile(&result.winner_id).map(|p| p.surface_rating(surface)),
            registry.profile(&result.loser_id).map(|p| p.surface_rating(surface)),
        );
        let (Some(winner_before), Some(loser_before)) = ratings else {
            warn!(
                "Skipping rating update for {} vs {}: profile missing",
                result.winner_id, result.loser_id
            );
            return Ok(None);
        };

        let winner_expected = elo::expected_score(winner_before, loser_before);
        let loser_expected = 1.0 - winner_expected;
        let winner_k = self.k_factor(result.winner_rank, result.tier);
        let loser_k = self.k_factor(result.loser_rank, result.tier);

        let winner_after = write_rating(
            registry,
            &result.winner_id,
            surface,
            elo::updated_rating(winner_before, winner_k, 1.0, winner_expected),
        );
        let loser_after = write_rating(
            registry,
            &result.loser_id,
            surface,
            elo::updated_rating(loser_before, loser_k, 0.0, loser_expected),
        );

        debug!(
            "{} rating {}: {:.1} → {:.1}, {}: {:.1} → {:.1}",
            surface, result.winner_id, winner_before, winner_after, result.loser_id, loser_before, loser_after
        );

        Ok(Some(RatingChange {
            surface,
            winner_id: result.winner_id.clone(),
            winner_before,
            winner_after,
            winner_k,
            loser_id: result.loser_id.clone(),
            loser_before,
            loser_after,
            loser_k,
        }))
    }

    fn run_pipeline(
        &self,
        registry: &ProfileRegistry,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
        model_probability: Option<f64>,
    ) -> StageBreakdown {
        let id1 = player1.lookup_id();
        let id2 = player2.lookup_id();
        let profiles = profile_pair(registry, id1, id2);
        let record = match (id1, id2) {
            (Some(a), Some(b)) => registry.pair_record(a, b),
            _ => None,
        };

        let ranking_prior = self.ranking_prior(player1.rank, player2.rank);
        let surface = self.apply_surface(ranking_prior, profiles, context.surface);
        let form = self.apply_form(surface, profiles, context.surface);
        let head_to_head = self.apply_head_to_head(form, record);
        let context_adjusted = self.apply_context(head_to_head, context);
        let external = model_probability.and_then(|m| self.apply_external(context_adjusted, m));

        StageBreakdown {
            ranking_prior,
            surface,
            form,
            head_to_head,
            context: context_adjusted,
            external,
        }
    }

    fn build_prediction(
        &self,
        registry: &ProfileRegistry,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
        model_probability: Option<f64>,
    ) -> MatchPrediction {
        let stages = self.run_pipeline(registry, player1, player2, context, model_probability);
        let lookup = |c: &Contestant| c.lookup_id().and_then(|id| registry.profile(id));
        let first = lookup(player1);
        let second = lookup(player2);

        MatchPrediction {
            player1: player1.clone(),
            player2: player2.clone(),
            context: *context,
            probability: stages.final_probability(),
            stages,
            player1_confidence: self.confidence(first, context.surface),
            player2_confidence: self.confidence(second, context.surface),
            player1_momentum: self.momentum(first),
            player2_momentum: self.momentum(second),
        }
    }

    fn blended_form(&self, profile: &CompetitorProfile, surface: Surface) -> f64 {
        let window = self.calibration.form_window;
        self.calibration.form_weight_recent * profile.recent_form(window)
            + self.calibration.form_weight_surface * profile.surface_form(surface, window)
    }

    fn k_factor(&self, rank: Option<i32>, tier: Tier) -> f64 {
        let rank = elo::effective_rank(rank, self.calibration.default_rank);
        elo::k_factor(rank, tier, &self.rating)
    }

    fn confidence(&self, profile: Option<&CompetitorProfile>, surface: Surface) -> ConfidenceLevel {
        profile
            .map(|p| p.confidence_level(surface))
            .unwrap_or(ConfidenceLevel::Unrated)
    }

    fn momentum(&self, profile: Option<&CompetitorProfile>) -> f64 {
        profile
            .map(|p| p.momentum(self.calibration.momentum_lookback))
            .unwrap_or(0.0)
    }

    fn clamp_probability(&self, p: f64) -> f64 {
        p.max(self.calibration.probability_floor)
            .min(self.calibration.probability_ceiling)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn profile_pair<'a>(
    registry: &'a ProfileRegistry,
    id1: Option<&str>,
    id2: Option<&str>,
) -> Option<ProfilePair<'a>> {
    let first = registry.profile(id1?)?;
    let second = registry.profile(id2?)?;
    Some((first, second))
}

/// Returns the rating actually stored after clamping
fn write_rating(registry: &mut ProfileRegistry, id: &str, surface: Surface, value: f64) -> f64 {
    match registry.profile_mut(id) {
        Some(profile) => {
            profile.set_surface_rating(surface, value);
            profile.surface_rating(surface)
        }
        None => value,
    }
}
