use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use espp_core::irs_limit::{self, LimitState, LimitStatus, RecommendationInput};
use espp_core::types::{
    DEFAULT_ANNUAL_FMV_LIMIT, DEFAULT_APPROACHING_LIMIT_THRESHOLD, DEFAULT_MAX_CONTRIBUTION_PCT,
};

use crate::input;

/// Arguments for IRS limit usage
#[derive(Args)]
pub struct LimitArgs {
    /// FMV already used this calendar year
    #[arg(long, default_value = "0")]
    pub prior_fmv: Decimal,

    /// FMV used by this period's purchase (shares x grant price)
    #[arg(long)]
    pub this_period_fmv: Decimal,

    /// Annual FMV limit
    #[arg(long, default_value_t = DEFAULT_ANNUAL_FMV_LIMIT)]
    pub annual_limit: Decimal,

    /// Remaining headroom that counts as approaching the limit
    #[arg(long, default_value_t = DEFAULT_APPROACHING_LIMIT_THRESHOLD)]
    pub threshold: Decimal,
}

/// Arguments for the next-period contribution estimate
#[derive(Args)]
pub struct RecommendArgs {
    /// Purchase date of the current period (YYYY-MM-DD)
    #[arg(long)]
    pub purchase_date: Option<NaiveDate>,

    /// Offering period length in months
    #[arg(long, default_value = "6")]
    pub period_months: u32,

    /// FMV headroom left this calendar year
    #[arg(long)]
    pub remaining: Option<Decimal>,

    /// Annual FMV limit
    #[arg(long, default_value_t = DEFAULT_ANNUAL_FMV_LIMIT)]
    pub annual_limit: Decimal,

    /// Current market price, used as the next grant price
    #[arg(long)]
    pub current_price: Option<Decimal>,

    /// Discount in percent
    #[arg(long, default_value = "15")]
    pub discount_rate: Decimal,

    /// Annual salary
    #[arg(long)]
    pub salary: Option<Decimal>,

    /// Current contribution rate in percent
    #[arg(long, default_value = "10")]
    pub contribution_pct: Decimal,

    /// Plan ceiling on the contribution rate
    #[arg(long, default_value_t = DEFAULT_MAX_CONTRIBUTION_PCT)]
    pub max_contribution_pct: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Serialize)]
struct LimitOutput {
    #[serde(flatten)]
    status: LimitStatus,
    state: LimitState,
}

pub fn run_limit(args: LimitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let status =
        irs_limit::compute_limit_status(args.prior_fmv, args.this_period_fmv, args.annual_limit)?;
    let state = status.state(args.threshold);
    Ok(serde_json::to_value(LimitOutput { status, state })?)
}

pub fn run_recommend(args: RecommendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rec_input: RecommendationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        RecommendationInput {
            purchase_date: args
                .purchase_date
                .ok_or("--purchase-date is required (or provide --input)")?,
            period_months: args.period_months,
            remaining_limit: args
                .remaining
                .ok_or("--remaining is required (or provide --input)")?,
            annual_limit: args.annual_limit,
            current_price: args
                .current_price
                .ok_or("--current-price is required (or provide --input)")?,
            discount_rate_pct: args.discount_rate,
            annual_salary: args.salary.ok_or("--salary is required (or provide --input)")?,
            current_contribution_pct: args.contribution_pct,
            max_contribution_pct: args.max_contribution_pct,
        }
    };

    let result = irs_limit::recommend_next_period(&rec_input)?;
    Ok(serde_json::to_value(result)?)
}

