pub mod backtest;
pub mod scenarios;

pub use backtest::{BacktestReport, BacktestService};
pub use scenarios::{ScenarioReport, ScenarioService};
