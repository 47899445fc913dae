pub mod elo;
pub mod profile;
pub mod tally;
pub mod types;
pub mod weighting;

pub use profile::{CompetitorProfile, ResultEntry};
pub use tally::{PairTally, SurfaceTally, WinLossTally};
pub use types::{ConfidenceLevel, RatingChange, RatingValue};
