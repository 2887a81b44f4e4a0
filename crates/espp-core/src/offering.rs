use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EsppError;
use crate::irs_limit::{
    compute_limit_status, recommend_next_period, LimitState, LimitStatus,
    NextPeriodRecommendation, RecommendationInput,
};
use crate::market_data::{resolve_period_prices, MarketData, PeriodPrices, PurchasePriceSource};
use crate::plan::{Participant, PlanConfig};
use crate::purchase::{compute_purchase, PurchaseInput, PurchaseResult};
use crate::schedule::{contribution_per_period, OfferingPeriod};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Percent};
use crate::EsppResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything needed to analyse one offering period once prices are known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingInput {
    #[serde(default)]
    pub plan: PlanConfig,
    pub participant: Participant,
    pub grant_date: NaiveDate,
    /// The day the analysis is run; decides whether the purchase has happened.
    pub as_of: NaiveDate,
    pub prices: PeriodPrices,
    /// Live market price, used to estimate the next period.
    pub current_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingAnalysis {
    pub period: OfferingPeriod,
    pub purchase_date: NaiveDate,
    pub contribution_per_period: Money,
    pub prices: PeriodPrices,
    /// Move from grant price to purchase price.
    pub price_change_pct: Percent,
    pub purchase: PurchaseResult,
    pub limit: LimitStatus,
    pub limit_state: LimitState,
    pub recommendation: NextPeriodRecommendation,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Run the purchase calculation, IRS limit check and next-period estimate
/// for one offering period.
pub fn analyze_offering(
    input: &OfferingInput,
) -> EsppResult<ComputationOutput<OfferingAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.plan.validate()?;
    input.participant.validate()?;
    if input.current_price <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "current_price",
            "current price must be > 0",
        ));
    }

    if input.as_of < input.grant_date {
        return Err(EsppError::invalid(
            "grant_date",
            "grant date must not be after the analysis date",
        ));
    }

    let plan = &input.plan;
    let participant = &input.participant;

    let period = OfferingPeriod::new(input.grant_date, plan.period_months)?;
    let purchase_date = period.purchase_date()?;
    let contribution = contribution_per_period(
        participant.annual_salary,
        participant.contribution_pct,
        plan.period_months,
    )?;

    let prices = &input.prices;
    let purchase = compute_purchase(&PurchaseInput {
        grant_price: prices.grant_price,
        purchase_price: prices.purchase_price,
        contribution,
        discount_rate_pct: plan.discount_rate_pct,
        has_lookback: plan.has_lookback,
    })?;
    let price_change_pct = (prices.purchase_price - prices.grant_price)
        .checked_div(prices.grant_price)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| EsppError::out_of_range("purchase_price"))?;

    if prices.purchase_price_source == PurchasePriceSource::CurrentLive {
        warnings.push(format!(
            "Purchase date {purchase_date} has not been reached; figures use the current price"
        ));
    }
    debug!("lookback side: {:?}", purchase.lookback_side);

    let limit = compute_limit_status(
        participant.prior_fmv_used,
        purchase.fmv_used,
        plan.annual_fmv_limit,
    )?;
    let limit_state = limit.state(plan.approaching_limit_threshold);
    match limit_state {
        LimitState::OverLimit => warnings.push(format!(
            "Over the annual FMV limit by {}; contributions may need to be reduced",
            limit.overage
        )),
        LimitState::ApproachingLimit => warnings.push(format!(
            "Approaching the annual FMV limit: {} remaining",
            limit.remaining_limit
        )),
        LimitState::WithinLimit => {}
    }

    let recommendation = recommend_next_period(&RecommendationInput {
        purchase_date,
        period_months: plan.period_months,
        remaining_limit: limit.remaining_limit,
        annual_limit: plan.annual_fmv_limit,
        current_price: input.current_price,
        discount_rate_pct: plan.discount_rate_pct,
        annual_salary: participant.annual_salary,
        current_contribution_pct: participant.contribution_pct,
        max_contribution_pct: plan.max_contribution_pct,
    })?;
    if recommendation.current_above_recommended {
        warnings.push(format!(
            "Consider reducing the contribution rate from {}% to {}% next period",
            participant.contribution_pct, recommendation.recommended_contribution_pct
        ));
    }
    warnings.push(recommendation.basis.clone());

    info!(
        "offering {}..{}: {} shares, gain {}, FMV used {} of {}",
        input.grant_date,
        purchase_date,
        purchase.whole_shares,
        purchase.gain_dollars,
        limit.total_fmv_used,
        limit.annual_limit
    );

    let output = OfferingAnalysis {
        period,
        purchase_date,
        contribution_per_period: round_money(contribution),
        prices: prices.clone(),
        price_change_pct: round_money(price_change_pct),
        purchase,
        limit,
        limit_state,
        recommendation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "ESPP offering analysis (lookback pricing, whole-share purchase, IRS FMV limit at grant price)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Resolve prices through `source` and analyse the period.
pub fn analyze_offering_from_source(
    source: &dyn MarketData,
    symbol: &str,
    plan: PlanConfig,
    participant: Participant,
    grant_date: NaiveDate,
    as_of: NaiveDate,
) -> EsppResult<ComputationOutput<OfferingAnalysis>> {
    plan.validate()?;
    let period = OfferingPeriod::new(grant_date, plan.period_months)?;
    let prices = resolve_period_prices(source, symbol, grant_date, period.purchase_date()?, as_of)?;
    let current_price = source.latest_price(symbol)?;
    analyze_offering(&OfferingInput {
        plan,
        participant,
        grant_date,
        as_of,
        prices,
        current_price,
    })
}
