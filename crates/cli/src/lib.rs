pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stocky",
    about = "Stocky operator CLI",
    long_about = "Operate the Stocky warehouse assistant: migrations, demo data, the daily batch \
                  pipeline (forecast, pairs, pricing), and readiness checks.",
    after_help = "Examples:\n  stocky migrate\n  stocky seed\n  stocky forecast\n  stocky doctor"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset and rebuild cross-sell pairs")]
    Seed,
    #[command(about = "Refresh the demand forecast table from pick history (replace-on-write)")]
    Forecast,
    #[command(about = "Rebuild cross-sell pairs from same-day co-occurrence in sales history")]
    Pairs,
    #[command(about = "Append a price-recommendation run over the recent sales window")]
    Pricing,
    #[command(about = "Validate config, database connectivity, schema, and forecast column resolution")]
    Doctor,
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Forecast => commands::forecast::run(),
        Command::Pairs => commands::pairs::run(),
        Command::Pricing => commands::pricing::run(),
        Command::Doctor => commands::doctor::run(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
