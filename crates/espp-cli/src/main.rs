mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::irs_limit::{LimitArgs, RecommendArgs};
use commands::market::PriceAtArgs;
use commands::offering::AnalyzeArgs;
use commands::purchase::PurchaseArgs;

/// Employee stock purchase plan calculations
#[derive(Parser)]
#[command(
    name = "espp",
    version,
    about = "Employee stock purchase plan calculations",
    long_about = "A CLI for ESPP purchase economics with decimal precision. Computes \
                  lookback pricing, whole-share purchases, gains, IRS FMV limit usage \
                  and next-period contribution estimates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Shares bought, cost and gain for one purchase
    Purchase(PurchaseArgs),
    /// IRS annual FMV limit usage
    IrsLimit(LimitArgs),
    /// Estimate the next period's contribution rate
    Recommend(RecommendArgs),
    /// Closing price nearest a date from a price history file
    PriceAt(PriceAtArgs),
    /// Full offering-period analysis
    Analyze(AnalyzeArgs),
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

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Purchase(args) => commands::purchase::run_purchase(args),
        Commands::IrsLimit(args) => commands::irs_limit::run_limit(args),
        Commands::Recommend(args) => commands::irs_limit::run_recommend(args),
        Commands::PriceAt(args) => commands::market::run_price_at(args),
        Commands::Analyze(args) => commands::offering::run_analyze(args),
        Commands::Version => {
            println!("espp {}", env!("CARGO_PKG_VERSION"));
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
