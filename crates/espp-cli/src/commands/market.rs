use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use crate::input;

/// Arguments for a closing-price lookup
#[derive(Args)]
pub struct PriceAtArgs {
    /// Price history file (CSV with date,close or JSON array)
    #[arg(long)]
    pub prices: String,

    /// Ticker symbol the history belongs to
    #[arg(long, default_value = "STOCK")]
    pub symbol: String,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
}

pub fn run_price_at(args: PriceAtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history = input::file::read_price_history(&args.prices, &args.symbol)?;
    let point = history.nearest(args.date)?;
    Ok(serde_json::json!({
        "symbol": history.symbol,
        "requested_date": args.date,
        "date": point.date,
        "close": point.close,
    }))
}
