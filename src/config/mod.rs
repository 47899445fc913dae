pub mod settings;

pub use settings::{
    BacktestSettings, CalibrationSettings, EngineConfig, ProfileSettings, RatingSettings,
    ValidationSettings,
};
