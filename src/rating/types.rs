use serde::{Deserialize, Serialize};

use crate::domain::{CompetitorId, Surface};

pub type RatingValue = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Unrated,     // < 10 contests
    Provisional, // 10-29 contests
    Emerging,    // 30-49 contests
    Established, // 50+ contests, full rating reliability
}

impl ConfidenceLevel {
    pub fn from_contests(contests: u32) -> Self {
        if contests < 10 {
            ConfidenceLevel::Unrated
        } else if contests < 30 {
            ConfidenceLevel::Provisional
        } else if contests < 50 {
            ConfidenceLevel::Emerging
        } else {
            ConfidenceLevel::Established
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfidenceLevel::Unrated => "unrated",
            ConfidenceLevel::Provisional => "provisional",
            ConfidenceLevel::Emerging => "emerging",
            ConfidenceLevel::Established => "established",
        }
    }
}

/// Surface ratings of both players before and after one update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingChange {
    pub surface: Surface,
    pub winner_id: CompetitorId,
    pub winner_before: RatingValue,
    pub winner_after: RatingValue,
    pub winner_k: f64,
    pub loser_id: CompetitorId,
    pub loser_before: RatingValue,
    pub loser_after: RatingValue,
    pub loser_k: f64,
}

impl RatingChange {
    pub fn winner_delta(&self) -> f64 {
        self.winner_after - self.winner_before
    }

    pub fn loser_delta(&self) -> f64 {
        self.loser_after - self.loser_before
    }
}
