use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::dates::ContestDate;
use super::stats::ServeStats;
use crate::errors::EngineError;

pub type CompetitorId = String;

/// Playing surface. Raw labels are normalised once, when they enter the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Surface {
    #[default]
    Hard,
    Clay,
    Grass,
    Carpet,
}

impl Surface {
    pub const ALL: [Surface; 4] = [Surface::Hard, Surface::Clay, Surface::Grass, Surface::Carpet];

    /// Missing, empty or unrecognised labels fall back to `Hard`
    pub fn normalize(raw: Option<&str>) -> Self {
        let label = raw.map(|s| s.trim().to_ascii_lowercase());
        match label.as_deref() {
            Some("clay") => Surface::Clay,
            Some("grass") => Surface::Grass,
            Some("carpet") => Surface::Carpet,
            _ => Surface::Hard,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Surface::Hard => 0,
            Surface::Clay => 1,
            Surface::Grass => 2,
            Surface::Carpet => 3,
        }
    }

    /// How strongly results on this surface diverge from overall strength
    pub fn specialization_weight(self) -> f64 {
        match self {
            Surface::Hard => 1.0,
            Surface::Clay => 1.2,
            Surface::Grass => 1.3,
            Surface::Carpet => 1.1,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Surface::Hard => "Hard",
            Surface::Clay => "Clay",
            Surface::Grass => "Grass",
            Surface::Carpet => "Carpet",
        }
    }
}

impl From<&str> for Surface {
    fn from(raw: &str) -> Self {
        Surface::normalize(Some(raw))
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Surface {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Surface::normalize(raw.as_deref()))
    }
}

/// Event tier. Missing or unknown levels are `Other`, never `GrandSlam`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Tier {
    GrandSlam,
    Masters,
    Atp500,
    Atp250,
    #[default]
    Other,
}

impl Tier {
    pub fn normalize(raw: Option<&str>) -> Self {
        let label = raw.map(|s| s.trim().to_ascii_lowercase());
        match label.as_deref() {
            Some("g" | "grandslam" | "grand slam" | "grand_slam") => Tier::GrandSlam,
            Some("m" | "masters" | "masters1000" | "1000") => Tier::Masters,
            Some("500" | "atp500") => Tier::Atp500,
            Some("a" | "250" | "atp250") => Tier::Atp250,
            _ => Tier::Other,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tier::GrandSlam => "Grand Slam",
            Tier::Masters => "Masters",
            Tier::Atp500 => "ATP 500",
            Tier::Atp250 => "ATP 250",
            Tier::Other => "Other",
        }
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Tier::normalize(raw.as_deref()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Round {
    Qualifying,
    R128,
    R64,
    R32,
    R16,
    QuarterFinal,
    SemiFinal,
    Final,
}

impl Round {
    /// Unknown labels yield `None`, which carries no round adjustment
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "q" | "q1" | "q2" | "q3" | "q4" | "qualifying" => Some(Round::Qualifying),
            "r128" => Some(Round::R128),
            "r64" => Some(Round::R64),
            "r32" => Some(Round::R32),
            "r16" => Some(Round::R16),
            "qf" | "quarterfinal" => Some(Round::QuarterFinal),
            "sf" | "semifinal" => Some(Round::SemiFinal),
            "f" | "final" => Some(Round::Final),
            _ => None,
        }
    }

    pub fn is_late_stage(self) -> bool {
        matches!(self, Round::SemiFinal | Round::Final)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Round::Qualifying => "Q",
            Round::R128 => "R128",
            Round::R64 => "R64",
            Round::R32 => "R32",
            Round::R16 => "R16",
            Round::QuarterFinal => "QF",
            Round::SemiFinal => "SF",
            Round::Final => "F",
        }
    }
}

fn deserialize_round<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Round>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Round::parse))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BestOf {
    #[default]
    Three,
    Five,
}

impl BestOf {
    pub fn from_sets(sets: Option<u32>) -> Self {
        match sets {
            Some(5) => BestOf::Five,
            _ => BestOf::Three,
        }
    }

    pub fn sets(self) -> u8 {
        match self {
            BestOf::Three => 3,
            BestOf::Five => 5,
        }
    }
}

impl Serialize for BestOf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.sets())
    }
}

impl<'de> Deserialize<'de> for BestOf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<u32>::deserialize(deserializer)?;
        Ok(BestOf::from_sets(raw))
    }
}

/// Conditions a contest is (or will be) played under
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContestContext {
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub date: Option<ContestDate>,
    #[serde(default, deserialize_with = "deserialize_round")]
    pub round: Option<Round>,
    #[serde(default)]
    pub best_of: BestOf,
}

impl ContestContext {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_date(mut self, date: ContestDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_best_of(mut self, best_of: BestOf) -> Self {
        self.best_of = best_of;
        self
    }
}

/// A finalized contest outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestResult {
    pub winner_id: CompetitorId,
    pub loser_id: CompetitorId,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub date: Option<ContestDate>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, deserialize_with = "deserialize_round")]
    pub round: Option<Round>,
    #[serde(default)]
    pub best_of: BestOf,
    #[serde(default)]
    pub winner_rank: Option<i32>,
    #[serde(default)]
    pub loser_rank: Option<i32>,
    #[serde(default)]
    pub winner_stats: Option<ServeStats>,
    #[serde(default)]
    pub loser_stats: Option<ServeStats>,
}

impl ContestResult {
    pub fn new(
        winner_id: impl Into<CompetitorId>,
        loser_id: impl Into<CompetitorId>,
        surface: Surface,
        date: Option<ContestDate>,
    ) -> Self {
        Self {
            winner_id: winner_id.into(),
            loser_id: loser_id.into(),
            surface,
            date,
            tier: Tier::Other,
            round: None,
            best_of: BestOf::Three,
            winner_rank: None,
            loser_rank: None,
            winner_stats: None,
            loser_stats: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_best_of(mut self, best_of: BestOf) -> Self {
        self.best_of = best_of;
        self
    }

    pub fn with_ranks(mut self, winner_rank: Option<i32>, loser_rank: Option<i32>) -> Self {
        self.winner_rank = winner_rank;
        self.loser_rank = loser_rank;
        self
    }

    pub fn with_stats(mut self, winner: Option<ServeStats>, loser: Option<ServeStats>) -> Self {
        self.winner_stats = winner;
        self.loser_stats = loser;
        self
    }

    pub fn context(&self) -> ContestContext {
        ContestContext {
            surface: self.surface,
            tier: self.tier,
            date: self.date,
            round: self.round,
            best_of: self.best_of,
        }
    }

    /// Both identities present and distinct
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.winner_id.trim().is_empty() {
            return Err(EngineError::MissingCompetitor { role: "winner" });
        }
        if self.loser_id.trim().is_empty() {
            return Err(EngineError::MissingCompetitor { role: "loser" });
        }
        if self.winner_id == self.loser_id {
            return Err(EngineError::SelfMatch {
                id: self.winner_id.clone(),
            });
        }
        Ok(())
    }
}

/// One side of a pairing as seen by the calibrator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contestant {
    pub id: Option<CompetitorId>,
    pub rank: Option<i32>,
}

impl Contestant {
    pub fn new(id: impl Into<CompetitorId>, rank: Option<i32>) -> Self {
        Self {
            id: Some(id.into()),
            rank,
        }
    }

    /// A competitor known only by ranking, with no profile lookups
    pub fn unidentified(rank: Option<i32>) -> Self {
        Self { id: None, rank }
    }

    /// Blank ids behave like absent ones
    pub fn lookup_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.lookup_id().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_normalization() {
        assert_eq!(Surface::normalize(None), Surface::Hard);
        assert_eq!(Surface::normalize(Some("")), Surface::Hard);
        assert_eq!(Surface::normalize(Some("Indoor")), Surface::Hard);
        assert_eq!(Surface::normalize(Some(" clay ")), Surface::Clay);
        assert_eq!(Surface::from("GRASS"), Surface::Grass);
        assert_eq!(Surface::from("Carpet"), Surface::Carpet);
    }

    #[test]
    fn test_tier_defaults_to_other() {
        assert_eq!(Tier::normalize(None), Tier::Other);
        assert_eq!(Tier::normalize(Some("D")), Tier::Other);
        assert_eq!(Tier::normalize(Some("G")), Tier::GrandSlam);
        assert_eq!(Tier::normalize(Some("M")), Tier::Masters);
        assert_eq!(Tier::normalize(Some("A")), Tier::Atp250);
        assert_eq!(Tier::normalize(Some("atp500")), Tier::Atp500);
    }

    #[test]
    fn test_round_parsing() {
        assert_eq!(Round::parse("SF"), Some(Round::SemiFinal));
        assert_eq!(Round::parse("F"), Some(Round::Final));
        assert_eq!(Round::parse("Q2"), Some(Round::Qualifying));
        assert_eq!(Round::parse("RR"), None);
        assert!(Round::Final.is_late_stage());
        assert!(!Round::QuarterFinal.is_late_stage());
    }

    #[test]
    fn test_result_deserialization_normalizes_labels() {
        let json = r#"{
            "winner_id": "federer",
            "loser_id": "nadal",
            "surface": "",
            "tier": "G",
            "round": "SF",
            "best_of": 5,
            "date": 20240601
        }"#;
        let result: ContestResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.surface, Surface::Hard);
        assert_eq!(result.tier, Tier::GrandSlam);
        assert_eq!(result.round, Some(Round::SemiFinal));
        assert_eq!(result.best_of, BestOf::Five);
        assert_eq!(result.context().date, Some(20240601));
    }

    #[test]
    fn test_result_serialization_round_trips_labels() {
        let result = ContestResult::new("a", "b", Surface::Clay, Some(20230101))
            .with_tier(Tier::Masters)
            .with_round(Round::QuarterFinal);
        let json = serde_json::to_string(&result).unwrap();
        let back: ContestResult = serde_json::from_str(&json).unwrap();

        assert_eq!(back, result);
    }

    #[test]
    fn test_validate_rejects_missing_and_self_matches() {
        let missing_winner = ContestResult::new("  ", "b", Surface::Hard, None);
        assert_eq!(
            missing_winner.validate(),
            Err(EngineError::MissingCompetitor { role: "winner" })
        );

        let missing_loser = ContestResult::new("a", "", Surface::Hard, None);
        assert_eq!(
            missing_loser.validate(),
            Err(EngineError::MissingCompetitor { role: "loser" })
        );

        let self_match = ContestResult::new("a", "a", Surface::Hard, None);
        assert!(matches!(self_match.validate(), Err(EngineError::SelfMatch { .. })));

        assert!(ContestResult::new("a", "b", Surface::Hard, None).validate().is_ok());
    }

    #[test]
    fn test_blank_contestant_id_is_not_looked_up() {
        assert_eq!(Contestant::new(" ", Some(3)).lookup_id(), None);
        assert_eq!(Contestant::new("x", None).lookup_id(), Some("x"));
        assert_eq!(Contestant::unidentified(Some(1)).display_name(), "unknown");
    }
}
