//! CLI definition and dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::csv_broker_adapter::CsvBrokerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::StratsimError;
use crate::domain::simulation::{run_simulation, SimulationSummary};
use crate::domain::strategy::Strategy;
use crate::domain::trigger::default_triggers;
use crate::ports::config_port::ConfigPort;

const CONFIG_SECTION: &str = "simulation";
const DEFAULT_BALANCE: f64 = 10_000.0;

#[derive(Parser, Debug)]
#[command(name = "stratsim", about = "Declarative trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a strategy over one or more symbols
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: PathBuf,
        /// Overrides the symbol list from the config file
        #[arg(long)]
        symbol: Option<String>,
        /// Overrides the starting balance from the config file
        #[arg(long)]
        balance: Option<f64>,
        /// Write the run summaries as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy document without fetching any data
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            strategy,
            symbol,
            balance,
            output,
        } => run_simulate(&config, &strategy, symbol, balance, output.as_deref()),
        Command::Validate { strategy } => run_validate(&strategy),
    }
}

fn load_strategy(path: &Path) -> Result<Strategy, StratsimError> {
    let content = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    Strategy::from_document(&document, default_triggers())
}

fn run_simulate(
    config_path: &Path,
    strategy_path: &Path,
    symbol_override: Option<String>,
    balance_override: Option<f64>,
    output_path: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match FileConfigAdapter::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Loading strategy from {}", strategy_path.display());
    let strategy = match load_strategy(strategy_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_dir = match config.get_string(CONFIG_SECTION, "data_dir") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let e = StratsimError::ConfigMissing {
                section: CONFIG_SECTION.to_string(),
                key: "data_dir".to_string(),
            };
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let balance =
        balance_override.unwrap_or_else(|| {
            config.get_double(CONFIG_SECTION, "balance", DEFAULT_BALANCE)
        });
    if balance <= 0.0 {
        let e = StratsimError::ConfigInvalid {
            section: CONFIG_SECTION.to_string(),
            key: "balance".to_string(),
            reason: format!("starting balance {balance} must be positive"),
        };
        eprintln!("error: {e}");
        return (&e).into();
    }

    let symbols = match symbol_override {
        Some(symbol) => vec![symbol],
        None => config.get_list(CONFIG_SECTION, "symbols"),
    };
    if symbols.is_empty() {
        let e = StratsimError::ConfigMissing {
            section: CONFIG_SECTION.to_string(),
            key: "symbols".to_string(),
        };
        eprintln!("error: {e}");
        return (&e).into();
    }

    let broker = CsvBrokerAdapter::new(data_dir);
    let mut summaries: Vec<SimulationSummary> = Vec::new();
    let mut first_failure: Option<ExitCode> = None;

    for symbol in &symbols {
        eprintln!("Simulating {symbol}...");
        match run_simulation(&broker, &strategy, symbol, balance) {
            Ok(result) => {
                let summary = result.summary();
                print_summary(&summary);
                summaries.push(summary);
            }
            Err(e) => {
                eprintln!("error: {symbol}: {e}");
                first_failure.get_or_insert((&e).into());
            }
        }
    }

    if let Some(path) = output_path {
        if let Err(e) = write_summaries(path, &summaries) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Wrote {} summaries to {}", summaries.len(), path.display());
    }

    first_failure.unwrap_or(ExitCode::SUCCESS)
}

fn print_summary(summary: &SimulationSummary) {
    println!(
        "{}: {} trades over {} days, effectiveness {}%, P/L {} ({}%), final balance {}",
        summary.symbol,
        summary.trades_made,
        summary.trading_days,
        summary.analysis.effectiveness,
        summary.analysis.total_profit_loss,
        summary.analysis.total_profit_loss_pct,
        summary.final_account_value,
    );
}

fn write_summaries(path: &Path, summaries: &[SimulationSummary]) -> Result<(), StratsimError> {
    let json = serde_json::to_string_pretty(summaries)?;
    fs::write(path, json)?;
    Ok(())
}

fn run_validate(strategy_path: &Path) -> ExitCode {
    let strategy = match load_strategy(strategy_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    // exercises the rule grammar of every key and value
    match strategy.simulation_window() {
        Ok((start, end, additional)) => {
            println!(
                "strategy is valid: {start} to {end}, {additional} warm-up days"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
