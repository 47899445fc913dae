use crate::config::RatingSettings;
use crate::domain::Tier;

use super::types::RatingValue;

const ELO_SCALE: f64 = 400.0;

/// Expected score of a player rated `rating` against `opponent`
pub fn expected_score(rating: RatingValue, opponent: RatingValue) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / ELO_SCALE))
}

/// Missing or non-positive ranks fall back to `default_rank`
pub fn effective_rank(rank: Option<i32>, default_rank: i32) -> i32 {
    rank.filter(|r| *r > 0).unwrap_or(default_rank).max(1)
}

/// Update step for one player: smaller for top-ranked players, larger at big events
pub fn k_factor(rank: i32, tier: Tier, settings: &RatingSettings) -> f64 {
    let base = if rank <= settings.high_rank_cutoff {
        settings.k_factor_high_rank
    } else {
        settings.k_factor_low_rank
    };
    base * tier_multiplier(tier, settings)
}

pub fn updated_rating(rating: RatingValue, k: f64, actual: f64, expected: f64) -> RatingValue {
    rating + k * (actual - expected)
}

fn tier_multiplier(tier: Tier, settings: &RatingSettings) -> f64 {
    match tier {
        Tier::GrandSlam => settings.grand_slam_multiplier,
        Tier::Masters => settings.masters_multiplier,
        Tier::Atp500 | Tier::Atp250 | Tier::Other => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_score_symmetry() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);

        let favourite = expected_score(1700.0, 1500.0);
        let underdog = expected_score(1500.0, 1700.0);
        assert!((favourite + underdog - 1.0).abs() < 1e-12);
        assert!((favourite - 0.759746926).abs() < 1e-6);
    }

    #[test]
    fn test_effective_rank_defaults() {
        assert_eq!(effective_rank(None, 500), 500);
        assert_eq!(effective_rank(Some(0), 500), 500);
        assert_eq!(effective_rank(Some(-3), 500), 500);
        assert_eq!(effective_rank(Some(7), 500), 7);
    }

    #[test]
    fn test_k_factor_by_rank_and_tier() {
        let settings = RatingSettings::default();

        assert_eq!(k_factor(50, Tier::Other, &settings), 20.0);
        assert_eq!(k_factor(51, Tier::Atp250, &settings), 32.0);
        assert!((k_factor(10, Tier::GrandSlam, &settings) - 24.0).abs() < 1e-12);
        assert!((k_factor(500, Tier::Masters, &settings) - 35.2).abs() < 1e-12);
    }

    #[test]
    fn test_updated_rating() {
        assert_eq!(updated_rating(1500.0, 32.0, 1.0, 0.5), 1516.0);
        assert_eq!(updated_rating(1500.0, 32.0, 0.0, 0.5), 1484.0);
    }
}
