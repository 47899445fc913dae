use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "court_rating: surface-aware rating and calibration engine")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Run the built-in calibration scenarios and print the report
    Scenarios {
        /// JSON engine config (optional, defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Replay a JSON array of contest results and score the predictions
    Backtest {
        /// Contest results, oldest first
        #[arg(short, long)]
        input: PathBuf,
        /// JSON engine config (optional, defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
