use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::tally::SurfaceTally;
use super::types::{ConfidenceLevel, RatingValue};
use super::weighting::{decayed_win_rate, streak_score};
use crate::config::ProfileSettings;
use crate::domain::{ContestDate, ServeAggregate, ServeStats, Surface, days_between};

/// One logged outcome from the competitor's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub won: bool,
    pub surface: Surface,
    pub date: Option<ContestDate>,
}

/// Everything known about one competitor: bounded result logs, per-surface
/// tallies and ratings, and running serve totals.
///
/// Logs are kept oldest first, in ingestion order. Tallies are unbounded and
/// keep counting after the logs start evicting.
#[derive(Debug, Clone)]
pub struct CompetitorProfile {
    settings: ProfileSettings,
    history: VecDeque<ResultEntry>,
    surface_history: [VecDeque<ResultEntry>; 4],
    surface_records: [SurfaceTally; 4],
    surface_ratings: [RatingValue; 4],
    serve: ServeAggregate,
}

impl CompetitorProfile {
    pub fn new(settings: ProfileSettings) -> Self {
        Self {
            settings,
            history: VecDeque::new(),
            surface_history: std::array::from_fn(|_| VecDeque::new()),
            surface_records: [SurfaceTally::default(); 4],
            surface_ratings: [settings.initial_rating; 4],
            serve: ServeAggregate::default(),
        }
    }

    pub fn record_result(&mut self, won: bool, surface: Surface, date: Option<ContestDate>) {
        let entry = ResultEntry { won, surface, date };

        push_bounded(&mut self.history, entry, self.settings.max_history);
        push_bounded(
            &mut self.surface_history[surface.index()],
            entry,
            self.settings.surface_history(),
        );
        self.surface_records[surface.index()].record(won);
    }

    pub fn record_serve_stats(&mut self, stats: &ServeStats) {
        self.serve.add(stats);
    }

    /// Decay-weighted win rate over the last `last_n` results
    pub fn recent_form(&self, last_n: usize) -> f64 {
        self.form_over(&self.history, last_n)
    }

    pub fn surface_form(&self, surface: Surface, last_n: usize) -> f64 {
        self.form_over(&self.surface_history[surface.index()], last_n)
    }

    /// Streak indicator in [-1, 1]; positive while winning
    pub fn momentum(&self, lookback: usize) -> f64 {
        if lookback == 0 || self.history.is_empty() {
            return 0.0;
        }

        let outcomes = self.history.iter().rev().take(lookback).map(|e| e.won);
        let streak = streak_score(outcomes, self.settings.streak_decay);
        (streak / lookback as f64).tanh()
    }

    pub fn surface_rating(&self, surface: Surface) -> RatingValue {
        self.surface_ratings[surface.index()]
    }

    /// Writes are clamped to the rating bounds; non-finite values are dropped
    pub fn set_surface_rating(&mut self, surface: Surface, value: RatingValue) {
        if !value.is_finite() {
            return;
        }
        self.surface_ratings[surface.index()] = value
            .max(self.settings.rating_floor)
            .min(self.settings.rating_ceiling);
    }

    pub fn all_surface_ratings(&self) -> Vec<(Surface, RatingValue)> {
        Surface::ALL
            .iter()
            .map(|surface| (*surface, self.surface_rating(*surface)))
            .collect()
    }

    pub fn reset_ratings(&mut self) {
        self.surface_ratings = [self.settings.initial_rating; 4];
    }

    pub fn rating_reliability(&self, surface: Surface) -> f64 {
        if self.settings.reliability_matches == 0 {
            return 1.0;
        }
        let played = self.surface_record(surface).total() as f64;
        (played / self.settings.reliability_matches as f64).min(1.0)
    }

    pub fn confidence_level(&self, surface: Surface) -> ConfidenceLevel {
        ConfidenceLevel::from_contests(self.surface_record(surface).total())
    }

    pub fn surface_record(&self, surface: Surface) -> SurfaceTally {
        self.surface_records[surface.index()]
    }

    pub fn career_record(&self) -> SurfaceTally {
        self.surface_records
            .iter()
            .fold(SurfaceTally::default(), |total, record| total.combined(record))
    }

    /// Entries currently held in the global log (at most `max_history`)
    pub fn logged_results(&self) -> usize {
        self.history.len()
    }

    pub fn surface_logged_results(&self, surface: Surface) -> usize {
        self.surface_history[surface.index()].len()
    }

    /// The last `count` logged results, oldest first
    pub fn recent_results(&self, count: usize) -> Vec<ResultEntry> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    pub fn last_result_date(&self) -> Option<ContestDate> {
        self.history.iter().rev().find_map(|entry| entry.date)
    }

    /// Calendar days from the latest dated result to `as_of`, never negative
    pub fn days_since_last_result(&self, as_of: ContestDate) -> Option<i64> {
        let last = self.last_result_date()?;
        days_between(last, as_of).map(|days| days.max(0))
    }

    pub fn serve_record(&self) -> &ServeAggregate {
        &self.serve
    }

    pub fn serve_points_won_rate(&self) -> Option<f64> {
        self.serve.serve_points_won_rate()
    }

    pub fn break_point_save_rate(&self) -> Option<f64> {
        self.serve.break_point_save_rate()
    }

    fn form_over(&self, log: &VecDeque<ResultEntry>, last_n: usize) -> f64 {
        let outcomes = log.iter().rev().take(last_n).map(|e| e.won);
        decayed_win_rate(outcomes, self.settings.time_decay)
    }
}

impl Default for CompetitorProfile {
    fn default() -> Self {
        Self::new(ProfileSettings::default())
    }
}

fn push_bounded(log: &mut VecDeque<ResultEntry>, entry: ResultEntry, cap: usize) {
    if cap == 0 {
        return;
    }
    while log.len() >= cap {
        log.pop_front();
    }
    log.push_back(entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(results: &[(bool, Surface)]) -> CompetitorProfile {
        let mut profile = CompetitorProfile::default();
        for (won, surface) in results {
            profile.record_result(*won, *surface, None);
        }
        profile
    }

    #[test]
    fn test_empty_profile_defaults() {
        let profile = CompetitorProfile::default();

        assert_eq!(profile.recent_form(10), 0.5);
        assert_eq!(profile.surface_form(Surface::Clay, 10), 0.5);
        assert_eq!(profile.momentum(5), 0.0);
        assert_eq!(profile.rating_reliability(Surface::Hard), 0.0);
        assert_eq!(profile.confidence_level(Surface::Hard), ConfidenceLevel::Unrated);
        assert_eq!(profile.days_since_last_result(20240101), None);
        assert_eq!(profile.serve_points_won_rate(), None);
        for (_, rating) in profile.all_surface_ratings() {
            assert_eq!(rating, 1500.0);
        }
    }

    #[test]
    fn test_zero_window_is_neutral() {
        let profile = profile_with(&[(true, Surface::Hard), (true, Surface::Hard)]);

        assert_eq!(profile.recent_form(0), 0.5);
        assert_eq!(profile.momentum(0), 0.0);
    }

    #[test]
    fn test_recent_form_weights_latest_results() {
        // Oldest first: a loss, then a win
        let profile = profile_with(&[(false, Surface::Hard), (true, Surface::Hard)]);

        let expected = 1.0 / (1.0 + 0.95);
        assert!((profile.recent_form(10) - expected).abs() < 1e-12);
        assert!((profile.recent_form(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_surface_form_uses_surface_log_only() {
        let profile = profile_with(&[
            (true, Surface::Clay),
            (false, Surface::Hard),
            (false, Surface::Hard),
        ]);

        assert_eq!(profile.surface_form(Surface::Clay, 10), 1.0);
        assert_eq!(profile.surface_form(Surface::Hard, 10), 0.0);
        assert_eq!(profile.surface_form(Surface::Grass, 10), 0.5);
    }

    #[test]
    fn test_momentum_divides_by_lookback() {
        let profile = profile_with(&[(true, Surface::Hard), (true, Surface::Hard)]);

        let expected = ((1.0 + 0.8) / 5.0_f64).tanh();
        assert!((profile.momentum(5) - expected).abs() < 1e-12);

        let losing = profile_with(&[(false, Surface::Hard); 6]);
        assert!(losing.momentum(5) < 0.0);
        assert!(losing.momentum(5) >= -1.0);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut profile = CompetitorProfile::default();
        profile.record_result(false, Surface::Hard, Some(20200101));
        for _ in 0..500 {
            profile.record_result(true, Surface::Clay, Some(20200102));
        }

        assert_eq!(profile.logged_results(), 500);
        assert!(profile.recent_results(500).iter().all(|e| e.won));
        assert_eq!(profile.surface_logged_results(Surface::Clay), 250);
        // Tallies keep counting past the log caps
        assert_eq!(profile.surface_record(Surface::Clay).wins, 500);
        assert_eq!(profile.career_record().total(), 501);
    }

    #[test]
    fn test_reliability_saturates() {
        let mut profile = CompetitorProfile::default();
        let mut previous = 0.0;
        for _ in 0..60 {
            profile.record_result(true, Surface::Grass, None);
            let reliability = profile.rating_reliability(Surface::Grass);
            assert!(reliability >= previous);
            previous = reliability;
        }

        assert_eq!(previous, 1.0);
        assert_eq!(profile.rating_reliability(Surface::Hard), 0.0);
        assert_eq!(
            profile.confidence_level(Surface::Grass),
            ConfidenceLevel::Established
        );
    }

    #[test]
    fn test_rating_writes_are_clamped() {
        let mut profile = CompetitorProfile::default();

        profile.set_surface_rating(Surface::Clay, 3000.0);
        assert_eq!(profile.surface_rating(Surface::Clay), 2500.0);

        profile.set_surface_rating(Surface::Clay, 10.0);
        assert_eq!(profile.surface_rating(Surface::Clay), 1000.0);

        profile.set_surface_rating(Surface::Clay, f64::NAN);
        assert_eq!(profile.surface_rating(Surface::Clay), 1000.0);

        profile.reset_ratings();
        assert_eq!(profile.surface_rating(Surface::Clay), 1500.0);
    }

    #[test]
    fn test_recent_results_oldest_first() {
        let profile = profile_with(&[
            (true, Surface::Hard),
            (false, Surface::Clay),
            (true, Surface::Grass),
        ]);

        let recent = profile.recent_results(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].surface, Surface::Clay);
        assert_eq!(recent[1].surface, Surface::Grass);
        assert_eq!(profile.recent_results(10).len(), 3);
    }

    #[test]
    fn test_days_since_last_result() {
        let mut profile = CompetitorProfile::default();
        profile.record_result(true, Surface::Hard, Some(20240110));
        profile.record_result(true, Surface::Hard, None);

        assert_eq!(profile.last_result_date(), Some(20240110));
        assert_eq!(profile.days_since_last_result(20240201), Some(22));
        assert_eq!(profile.days_since_last_result(20240101), Some(0));
        assert_eq!(profile.days_since_last_result(20241340), None);
    }

    #[test]
    fn test_serve_stats_accumulate() {
        let mut profile = CompetitorProfile::default();
        profile.record_serve_stats(&ServeStats {
            serve_points: Some(60),
            first_serve_won: Some(30),
            second_serve_won: Some(12),
            break_points_faced: Some(4),
            break_points_saved: Some(3),
            ..ServeStats::default()
        });

        assert_eq!(profile.serve_record().contests, 1);
        assert!((profile.serve_points_won_rate().unwrap() - 0.7).abs() < 1e-12);
        assert!((profile.break_point_save_rate().unwrap() - 0.75).abs() < 1e-12);
    }
}
