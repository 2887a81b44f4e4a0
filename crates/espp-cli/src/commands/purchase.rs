use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use espp_core::purchase::{self, PurchaseInput};

use crate::input;

/// Arguments for a single-period purchase calculation
#[derive(Args)]
pub struct PurchaseArgs {
    /// Closing price on the grant (offering) date
    #[arg(long)]
    pub grant_price: Option<Decimal>,

    /// Closing price on the purchase date
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Contributions accumulated over the period
    #[arg(long)]
    pub contribution: Option<Decimal>,

    /// Discount in percent (15 = 15%)
    #[arg(long, default_value = "15")]
    pub discount_rate: Decimal,

    /// Plan has no lookback provision
    #[arg(long)]
    pub no_lookback: bool,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_purchase(args: PurchaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let purchase_input: PurchaseInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        PurchaseInput {
            grant_price: args
                .grant_price
                .ok_or("--grant-price is required (or provide --input)")?,
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            contribution: args
                .contribution
                .ok_or("--contribution is required (or provide --input)")?,
            discount_rate_pct: args.discount_rate,
            has_lookback: !args.no_lookback,
        }
    };

    let result = purchase::compute_purchase(&purchase_input)?;
    Ok(serde_json::to_value(result)?)
}
