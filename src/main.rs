use anyhow::Result;

use court_rating::cli::Command;
use court_rating::{handle_backtest, handle_scenarios, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Scenarios { config } => handle_scenarios(config.as_deref()),
        Command::Backtest { input, config } => handle_backtest(input, config.as_deref()),
    }
}
