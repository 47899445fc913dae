use std::sync::Arc;

use parking_lot::RwLock;

use super::ProfileRegistry;
use crate::calibration::RatingCalibrator;
use crate::domain::{ContestContext, ContestResult, Contestant};
use crate::errors::EngineError;
use crate::rating::RatingChange;

/// Thread-safe handle to one registry: a single writer at a time, any number
/// of readers. A result is applied under one write guard, so readers never
/// see it half-way.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<ProfileRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: ProfileRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn ingest(&self, result: &ContestResult) -> Result<(), EngineError> {
        self.inner.write().ingest(result)
    }

    /// Ingest and rate a result atomically
    pub fn apply_result(
        &self,
        calibrator: &RatingCalibrator,
        result: &ContestResult,
    ) -> Result<Option<RatingChange>, EngineError> {
        let mut registry = self.inner.write();
        registry.ingest(result)?;
        calibrator.update_ratings(&mut registry, result)
    }

    pub fn reset(&self) {
        self.inner.write().reset();
    }

    pub fn read<R>(&self, f: impl FnOnce(&ProfileRegistry) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn win_probability(
        &self,
        calibrator: &RatingCalibrator,
        player1: &Contestant,
        player2: &Contestant,
        context: &ContestContext,
    ) -> f64 {
        self.read(|registry| calibrator.win_probability(registry, player1, player2, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::Surface;

    #[test]
    fn test_concurrent_writers_and_readers() {
        let shared = SharedRegistry::default();
        let calibrator = RatingCalibrator::new(&EngineConfig::default());

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let shared = shared.clone();
                let calibrator = &calibrator;
                scope.spawn(move || {
                    for i in 0..25 {
                        let winner = format!("w{writer}");
                        let loser = format!("l{}", i % 5);
                        let result = ContestResult::new(winner, loser, Surface::Hard, None);
                        shared.apply_result(calibrator, &result).unwrap();
                    }
                });
            }
            for _ in 0..2 {
                let shared = shared.clone();
                let calibrator = &calibrator;
                scope.spawn(move || {
                    let ctx = ContestContext::new(Surface::Hard);
                    for _ in 0..50 {
                        let p = shared.win_probability(
                            calibrator,
                            &Contestant::new("w0", Some(10)),
                            &Contestant::new("l0", Some(20)),
                            &ctx,
                        );
                        assert!((0.05..=0.95).contains(&p));
                    }
                });
            }
        });

        assert_eq!(shared.read(|r| r.contests_ingested()), 100);
        assert_eq!(shared.read(|r| r.competitor_count()), 9);
    }

    #[test]
    fn test_rejected_result_is_not_rated() {
        let shared = SharedRegistry::default();
        let calibrator = RatingCalibrator::new(&EngineConfig::default());
        let result = ContestResult::new("a", "a", Surface::Clay, None);

        assert!(shared.apply_result(&calibrator, &result).is_err());
        assert!(shared.read(|r| r.is_empty()));

        shared.ingest(&ContestResult::new("a", "b", Surface::Clay, None)).unwrap();
        shared.reset();
        assert!(shared.read(|r| r.is_empty()));
    }
}
