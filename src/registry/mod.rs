pub mod shared;

use std::collections::HashMap;

use log::debug;

use crate::config::ProfileSettings;
use crate::domain::{CompetitorId, ContestResult, ServeStats};
use crate::errors::EngineError;
use crate::rating::{CompetitorProfile, PairTally};

pub use shared::SharedRegistry;

/// Owned store of every competitor profile and head-to-head tally.
///
/// Profiles are created on first sight and only ever change through
/// [`ProfileRegistry::ingest`] and rating updates.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    settings: ProfileSettings,
    profiles: HashMap<CompetitorId, CompetitorProfile>,
    pair_tallies: HashMap<CompetitorId, HashMap<CompetitorId, PairTally>>,
    contests_ingested: u64,
}

impl ProfileRegistry {
    pub fn new(settings: ProfileSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Record a finished contest for both sides. Rejected results leave the
    /// registry untouched. No deduplication: ingesting twice counts twice.
    pub fn ingest(&mut self, result: &ContestResult) -> Result<(), EngineError> {
        result.validate()?;

        debug!(
            "Ingesting {} def. {} on {}",
            result.winner_id, result.loser_id, result.surface
        );

        self.record_side(&result.winner_id, true, result, result.winner_stats.as_ref());
        self.record_side(&result.loser_id, false, result, result.loser_stats.as_ref());

        self.pair_entry(&result.winner_id, &result.loser_id).record(true);
        self.pair_entry(&result.loser_id, &result.winner_id).record(false);

        self.contests_ingested += 1;
        Ok(())
    }

    pub fn profile(&self, id: &str) -> Option<&CompetitorProfile> {
        self.profiles.get(id)
    }

    pub(crate) fn profile_mut(&mut self, id: &str) -> Option<&mut CompetitorProfile> {
        self.profiles.get_mut(id)
    }

    /// `a`'s record against `b`
    pub fn pair_record(&self, a: &str, b: &str) -> Option<&PairTally> {
        self.pair_tallies.get(a)?.get(b)
    }

    pub fn competitor_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn contests_ingested(&self) -> u64 {
        self.contests_ingested
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn reset(&mut self) {
        self.profiles.clear();
        self.pair_tallies.clear();
        self.contests_ingested = 0;
    }

    fn record_side(
        &mut self,
        id: &str,
        won: bool,
        result: &ContestResult,
        stats: Option<&ServeStats>,
    ) {
        let settings = self.settings;
        let profile = self
            .profiles
            .entry(id.to_string())
            .or_insert_with(|| CompetitorProfile::new(settings));

        profile.record_result(won, result.surface, result.date);
        if let Some(stats) = stats {
            profile.record_serve_stats(stats);
        }
    }

    fn pair_entry(&mut self, a: &str, b: &str) -> &mut PairTally {
        self.pair_tallies
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_default()
    }
}
