use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use espp_core::market_data::{CachedMarketData, StaticMarketData};
use espp_core::offering::{self, OfferingInput};
use espp_core::plan::{Participant, PlanConfig};

use crate::input;

/// Arguments for a full offering-period analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON OfferingInput with prices already resolved
    #[arg(long, conflicts_with = "prices")]
    pub input: Option<String>,

    /// Price history file (CSV with date,close or JSON array)
    #[arg(long)]
    pub prices: Option<String>,

    /// Ticker symbol
    #[arg(long, default_value = "STOCK")]
    pub symbol: String,

    /// Current market price; defaults to the last close in the history
    #[arg(long)]
    pub current_price: Option<Decimal>,

    /// Offering start date (YYYY-MM-DD)
    #[arg(long)]
    pub grant_date: Option<NaiveDate>,

    /// Analysis date; defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Plan settings file (JSON or YAML)
    #[arg(long)]
    pub plan: Option<String>,

    /// Override the plan discount (percent)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Override the plan lookback provision
    #[arg(long)]
    pub lookback: Option<bool>,

    /// Override the plan period length in months
    #[arg(long)]
    pub period_months: Option<u32>,

    /// Override the annual FMV limit
    #[arg(long)]
    pub annual_limit: Option<Decimal>,

    /// Annual salary
    #[arg(long)]
    pub salary: Option<Decimal>,

    /// Contribution rate in percent
    #[arg(long, default_value = "10")]
    pub contribution_pct: Decimal,

    /// FMV already used this calendar year
    #[arg(long, default_value = "0")]
    pub prior_fmv: Decimal,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        let offering_input: OfferingInput = input::file::read_json(path)?;
        let result = offering::analyze_offering(&offering_input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let prices_path = args
        .prices
        .as_deref()
        .ok_or("--prices <file> is required (or provide --input)")?;
    let grant_date = args
        .grant_date
        .ok_or("--grant-date is required (or provide --input)")?;
    let salary = args.salary.ok_or("--salary is required (or provide --input)")?;

    let plan = build_plan(&args)?;
    let participant = Participant {
        annual_salary: salary,
        contribution_pct: args.contribution_pct,
        prior_fmv_used: args.prior_fmv,
    };
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let history = input::file::read_price_history(prices_path, &args.symbol)?;
    let mut source = StaticMarketData::new().with_history(history);
    if let Some(price) = args.current_price {
        source = source.with_latest(&args.symbol, price);
    }
    let source = CachedMarketData::new(source);

    let result = offering::analyze_offering_from_source(
        &source,
        &args.symbol,
        plan,
        participant,
        grant_date,
        as_of,
    )?;
    Ok(serde_json::to_value(result)?)
}

fn build_plan(args: &AnalyzeArgs) -> Result<PlanConfig, Box<dyn std::error::Error>> {
    let mut plan: PlanConfig = match args.plan {
        Some(ref path) => input::file::read_config(path)?,
        None => PlanConfig::default(),
    };
    if let Some(rate) = args.discount_rate {
        plan.discount_rate_pct = rate;
    }
    if let Some(lookback) = args.lookback {
        plan.has_lookback = lookback;
    }
    if let Some(months) = args.period_months {
        plan.period_months = months;
    }
    if let Some(limit) = args.annual_limit {
        plan.annual_fmv_limit = limit;
    }
    Ok(plan)
}
