mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::mortgage::{PaymentArgs, ScheduleArgs};
use commands::renewal::RenewalArgs;

/// Canadian mortgage amortization and renewal planning
#[derive(Parser)]
#[command(
    name = "cmc",
    version,
    about = "Canadian mortgage amortization and renewal planning",
    long_about = "Models Canadian residential mortgages (semi-annual compounding, \
                  monthly payments) with decimal precision: monthly payment \
                  calculation, full amortization schedules with extra payments \
                  and payment gaps, and renewal scenario comparison with \
                  paydown sweeps and opportunity-cost analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the fixed monthly payment for a mortgage
    Payment(PaymentArgs),
    /// Build a full month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Compare renewal scenarios with a lump-sum paydown sweep
    Renewal(RenewalArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::mortgage::run_payment(args),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::Renewal(args) => commands::renewal::run_renewal(args),
        Commands::Version => {
            println!("cmc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
