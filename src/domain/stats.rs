use serde::{Deserialize, Serialize};

/// Per-player serve/return counts for one contest; every field is optional
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeStats {
    pub aces: Option<u32>,
    pub double_faults: Option<u32>,
    pub serve_points: Option<u32>,
    pub first_serve_in: Option<u32>,
    pub first_serve_won: Option<u32>,
    pub second_serve_won: Option<u32>,
    pub service_games: Option<u32>,
    pub break_points_saved: Option<u32>,
    pub break_points_faced: Option<u32>,
}

impl ServeStats {
    pub fn first_serve_percentage(&self) -> Option<f64> {
        ratio(self.first_serve_in, self.serve_points)
    }

    pub fn first_serve_win_percentage(&self) -> Option<f64> {
        ratio(self.first_serve_won, self.first_serve_in)
    }

    pub fn second_serve_win_percentage(&self) -> Option<f64> {
        let second_serve_points = self.serve_points?.checked_sub(self.first_serve_in?)?;
        ratio(self.second_serve_won, Some(second_serve_points))
    }

    pub fn ace_rate(&self) -> Option<f64> {
        ratio(self.aces, self.serve_points)
    }

    pub fn double_fault_rate(&self) -> Option<f64> {
        ratio(self.double_faults, self.serve_points)
    }

    pub fn break_point_save_percentage(&self) -> Option<f64> {
        ratio(self.break_points_saved, self.break_points_faced)
    }

    fn serve_points_won(&self) -> Option<u32> {
        self.first_serve_won?.checked_add(self.second_serve_won?)
    }
}

fn ratio(numerator: Option<u32>, denominator: Option<u32>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0 => Some(n as f64 / d as f64),
        _ => None,
    }
}

/// Running serve totals across every contest that reported statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServeAggregate {
    pub contests: u32,
    pub serve_points: u64,
    pub serve_points_won: u64,
    pub break_points_faced: u64,
    pub break_points_saved: u64,
}

impl ServeAggregate {
    pub fn add(&mut self, stats: &ServeStats) {
        self.contests += 1;

        // Points only count when both the total and the won split are known
        if let (Some(points), Some(won)) = (stats.serve_points, stats.serve_points_won()) {
            self.serve_points += u64::from(points);
            self.serve_points_won += u64::from(won.min(points));
        }

        if let (Some(faced), Some(saved)) = (stats.break_points_faced, stats.break_points_saved) {
            self.break_points_faced += u64::from(faced);
            self.break_points_saved += u64::from(saved.min(faced));
        }
    }

    pub fn serve_points_won_rate(&self) -> Option<f64> {
        (self.serve_points > 0).then(|| self.serve_points_won as f64 / self.serve_points as f64)
    }

    pub fn break_point_save_rate(&self) -> Option<f64> {
        (self.break_points_faced > 0)
            .then(|| self.break_points_saved as f64 / self.break_points_faced as f64)
    }
}
