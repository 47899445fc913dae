use std::fmt;

use serde::Serialize;

use crate::domain::{ContestContext, Contestant};
use crate::rating::ConfidenceLevel;

/// Probability after each pipeline stage, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageBreakdown {
    pub ranking_prior: f64,
    pub surface: f64,
    pub form: f64,
    pub head_to_head: f64,
    /// Tournament adjustments plus the final clamp
    pub context: f64,
    /// Present only when a valid external model probability was blended in
    pub external: Option<f64>,
}

impl StageBreakdown {
    pub fn final_probability(&self) -> f64 {
        self.external.unwrap_or(self.context)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPrediction {
    pub player1: Contestant,
    pub player2: Contestant,
    pub context: ContestContext,
    /// Probability that player1 wins
    pub probability: f64,
    pub stages: StageBreakdown,
    pub player1_confidence: ConfidenceLevel,
    pub player2_confidence: ConfidenceLevel,
    pub player1_momentum: f64,
    pub player2_momentum: f64,
}

impl MatchPrediction {
    pub fn player2_probability(&self) -> f64 {
        1.0 - self.probability
    }

    /// Ties go to player1
    pub fn favorite(&self) -> &Contestant {
        if self.probability >= 0.5 {
            &self.player1
        } else {
            &self.player2
        }
    }

    pub fn favorite_probability(&self) -> f64 {
        self.probability.max(self.player2_probability())
    }
}

impl fmt::Display for MatchPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let round = self.context.round.as_ref().map(|r| r.as_str()).unwrap_or("-");
        write!(
            f,
            "{} vs {} [{} {} {}]: {:.1}% / {:.1}% (prior {:.3}, surface {:.3}, form {:.3}, h2h {:.3}, context {:.3})",
            self.player1.display_name(),
            self.player2.display_name(),
            self.context.surface,
            self.context.tier.as_str(),
            round,
            self.probability * 100.0,
            self.player2_probability() * 100.0,
            self.stages.ranking_prior,
            self.stages.surface,
            self.stages.form,
            self.stages.head_to_head,
            self.stages.context,
        )?;
        if let Some(external) = self.stages.external {
            write!(f, " blended {:.3}", external)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Surface;

    fn prediction(probability: f64) -> MatchPrediction {
        let stages = StageBreakdown {
            ranking_prior: probability,
            surface: probability,
            form: probability,
            head_to_head: probability,
            context: probability,
            external: None,
        };
        MatchPrediction {
            player1: Contestant::new("a", Some(3)),
            player2: Contestant::unidentified(Some(40)),
            context: ContestContext::new(Surface::Grass),
            probability,
            stages,
            player1_confidence: ConfidenceLevel::Unrated,
            player2_confidence: ConfidenceLevel::Unrated,
            player1_momentum: 0.0,
            player2_momentum: 0.0,
        }
    }

    #[test]
    fn test_favorite() {
        let p = prediction(0.3);
        assert_eq!(p.favorite().display_name(), "unknown");
        assert!((p.favorite_probability() - 0.7).abs() < 1e-12);

        let even = prediction(0.5);
        assert_eq!(even.favorite().display_name(), "a");
    }

    #[test]
    fn test_display_mentions_both_players() {
        let text = prediction(0.62).to_string();
        assert!(text.starts_with("a vs unknown [Grass"));
        assert!(text.contains("62.0%"));
        assert!(!text.contains("blended"));
    }
}
