use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use espp_core::irs_limit::{self, RecommendationInput};
use espp_core::market_data::{PriceHistory, PricePoint};
use espp_core::offering::{self, OfferingInput};
use espp_core::purchase::{self, PurchaseInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Purchase
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_purchase(input_json: String) -> NapiResult<String> {
    let input: PurchaseInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = purchase::compute_purchase(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// IRS limit
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LimitRequest {
    #[serde(default)]
    prior_fmv_used: Decimal,
    this_period_fmv: Decimal,
    #[serde(default = "default_limit")]
    annual_limit: Decimal,
}

fn default_limit() -> Decimal {
    espp_core::DEFAULT_ANNUAL_FMV_LIMIT
}

#[napi]
pub fn compute_limit_status(input_json: String) -> NapiResult<String> {
    let req: LimitRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        irs_limit::compute_limit_status(req.prior_fmv_used, req.this_period_fmv, req.annual_limit)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn recommend_next_period(input_json: String) -> NapiResult<String> {
    let input: RecommendationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = irs_limit::recommend_next_period(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Prices and full analysis
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NearestRequest {
    symbol: String,
    date: NaiveDate,
    points: Vec<PricePoint>,
}

#[napi]
pub fn price_at_date(input_json: String) -> NapiResult<String> {
    let req: NearestRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let history = PriceHistory::new(req.symbol, req.points);
    let point = history.nearest(req.date).map_err(to_napi_error)?;
    serde_json::to_string(&point).map_err(to_napi_error)
}

#[napi]
pub fn analyze_offering(input_json: String) -> NapiResult<String> {
    let input: OfferingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = offering::analyze_offering(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
