use serde::{Deserialize, Serialize};

use super::weighting::NEUTRAL_RATE;

/// Plain win/loss counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLossTally {
    pub wins: u32,
    pub losses: u32,
}

/// Results of one competitor on one surface
pub type SurfaceTally = WinLossTally;

/// Results of one competitor against one specific opponent. `(a, b)` and
/// `(b, a)` are separate counters that mirror each other.
pub type PairTally = WinLossTally;

impl WinLossTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// 0.5 with no contests: unknown is treated as even
    pub fn win_rate(&self) -> f64 {
        match self.total() {
            0 => NEUTRAL_RATE,
            total => self.wins as f64 / total as f64,
        }
    }

    pub fn combined(&self, other: &WinLossTally) -> WinLossTally {
        WinLossTally {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
        }
    }
}
