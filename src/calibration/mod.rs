pub mod calibrator;
pub mod prediction;
pub mod validator;

pub use calibrator::RatingCalibrator;
pub use prediction::{MatchPrediction, StageBreakdown};
pub use validator::{CalibrationBin, CalibrationMetrics, CalibrationValidator};
