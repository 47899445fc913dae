pub mod dates;
pub mod models;
pub mod stats;

pub use dates::{ContestDate, days_between, parse_contest_date};
pub use models::*;
pub use stats::{ServeAggregate, ServeStats};
