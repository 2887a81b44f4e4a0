use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EsppError;
use crate::plan::{validate_pct, validate_period_months};
use crate::schedule::{contribution_per_period, periods_per_year, purchase_date};
use crate::types::{
    pct_to_fraction, round_money, Money, Percent, DEFAULT_APPROACHING_LIMIT_THRESHOLD,
    DEFAULT_MAX_CONTRIBUTION_PCT,
};
use crate::EsppResult;

// ---------------------------------------------------------------------------
// Limit status
// ---------------------------------------------------------------------------

/// FMV usage against the annual limit for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitStatus {
    pub prior_fmv_used: Money,
    pub this_period_fmv: Money,
    /// Not clamped; may exceed `annual_limit`.
    pub total_fmv_used: Money,
    pub annual_limit: Money,
    /// Clamped at zero.
    pub remaining_limit: Money,
    /// Clamped at 100 for progress display.
    pub usage_pct: Percent,
    pub overage: Money,
    pub over_limit: bool,
}

/// Advisory classification of a [`LimitStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitState {
    WithinLimit,
    ApproachingLimit,
    OverLimit,
}

impl LimitStatus {
    /// Classify usage; `threshold` is the remaining headroom below which the
    /// limit counts as approaching.
    pub fn state(&self, threshold: Money) -> LimitState {
        if self.total_fmv_used > self.annual_limit {
            LimitState::OverLimit
        } else if self.remaining_limit < threshold {
            LimitState::ApproachingLimit
        } else {
            LimitState::WithinLimit
        }
    }

    pub fn default_state(&self) -> LimitState {
        self.state(DEFAULT_APPROACHING_LIMIT_THRESHOLD)
    }
}

/// Add this period's FMV to the year's running total and compare against
/// the annual limit.
pub fn compute_limit_status(
    prior_fmv_used: Money,
    this_period_fmv: Money,
    annual_limit: Money,
) -> EsppResult<LimitStatus> {
    if prior_fmv_used < Decimal::ZERO {
        return Err(EsppError::invalid(
            "prior_fmv_used",
            "prior FMV used must be >= 0",
        ));
    }
    if this_period_fmv < Decimal::ZERO {
        return Err(EsppError::invalid(
            "this_period_fmv",
            "this period's FMV must be >= 0",
        ));
    }
    if annual_limit <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "annual_limit",
            "annual FMV limit must be > 0",
        ));
    }

    let total = prior_fmv_used
        .checked_add(this_period_fmv)
        .ok_or_else(|| EsppError::out_of_range("this_period_fmv"))?;
    let remaining = (annual_limit - total).max(Decimal::ZERO);
    let usage_pct = total
        .checked_div(annual_limit)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ONE_HUNDRED, |p| p.min(Decimal::ONE_HUNDRED));
    let overage = (total - annual_limit).max(Decimal::ZERO);
    let over_limit = total > annual_limit;

    if over_limit {
        warn!("FMV {total} exceeds annual limit {annual_limit} by {overage}");
    }

    Ok(LimitStatus {
        prior_fmv_used: round_money(prior_fmv_used),
        this_period_fmv: round_money(this_period_fmv),
        total_fmv_used: round_money(total),
        annual_limit: round_money(annual_limit),
        remaining_limit: round_money(remaining),
        usage_pct: round_money(usage_pct),
        overage: round_money(overage),
        over_limit,
    })
}

// ---------------------------------------------------------------------------
// Next-period recommendation
// ---------------------------------------------------------------------------

/// Inputs for the next period's contribution estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    /// Purchase date of the current period, which is also the next grant date.
    pub purchase_date: NaiveDate,
    pub period_months: u32,
    pub remaining_limit: Money,
    pub annual_limit: Money,
    /// Stand-in for the next period's unknown grant price.
    pub current_price: Money,
    pub discount_rate_pct: Percent,
    pub annual_salary: Money,
    pub current_contribution_pct: Percent,
    #[serde(default = "default_max_contribution_pct")]
    pub max_contribution_pct: Percent,
}

fn default_max_contribution_pct() -> Percent {
    DEFAULT_MAX_CONTRIBUTION_PCT
}

/// Advisory estimate for the next offering period. The future grant price is
/// unknown, so every share figure is priced at today's market price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPeriodRecommendation {
    pub next_grant_date: NaiveDate,
    pub next_purchase_date: NaiveDate,
    pub reference_year: i32,
    pub crosses_new_year: bool,
    pub available_fmv: Money,
    pub estimated_grant_price: Money,
    pub estimated_discounted_price: Money,
    pub estimated_max_shares: Decimal,
    pub max_contribution_per_period: Money,
    pub max_annual_contribution: Money,
    pub recommended_contribution_pct: Percent,
    pub current_contribution_pct: Percent,
    pub current_contribution_per_period: Money,
    pub current_within_estimate: bool,
    /// Compared against the unrounded ceiling, so a rate that rounds to the
    /// reported figure can still be above it.
    pub current_above_recommended: bool,
    pub is_estimate: bool,
    pub basis: String,
}

/// Estimate the highest contribution rate that keeps the next purchase
/// inside the IRS limit.
pub fn recommend_next_period(input: &RecommendationInput) -> EsppResult<NextPeriodRecommendation> {
    validate_recommendation(input)?;

    let next_grant_date = input.purchase_date;
    let next_purchase_date = purchase_date(next_grant_date, input.period_months)?;
    let reference_year = input.purchase_date.year();
    let crosses_new_year = next_purchase_date.year() > reference_year;

    // A purchase in a new calendar year gets a fresh allowance.
    let available_fmv = if crosses_new_year {
        input.annual_limit
    } else {
        input.remaining_limit.max(Decimal::ZERO)
    };

    let periods = periods_per_year(input.period_months)?;
    let current_per_period = contribution_per_period(
        input.annual_salary,
        input.current_contribution_pct,
        input.period_months,
    )?;
    let estimated_discounted =
        input.current_price * (Decimal::ONE - pct_to_fraction(input.discount_rate_pct));

    let overflow = || EsppError::out_of_range("available_fmv");
    let (max_shares, max_per_period, max_annual, ceiling) = if available_fmv <= Decimal::ZERO {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    } else {
        let max_shares = available_fmv
            .checked_div(input.current_price)
            .ok_or_else(overflow)?;
        let max_per_period = max_shares
            .checked_mul(estimated_discounted)
            .ok_or_else(overflow)?;
        let max_annual = max_per_period.checked_mul(periods).ok_or_else(overflow)?;
        let ceiling = max_annual
            .checked_div(input.annual_salary)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(input.max_contribution_pct, |p| p.min(input.max_contribution_pct));
        (max_shares, max_per_period, max_annual, ceiling)
    };
    let over_ceiling = input.current_contribution_pct > ceiling;
    let recommended = ceiling.round_dp(1);

    debug!(
        "next period {next_grant_date}..{next_purchase_date}: available_fmv={available_fmv} recommended={recommended}%"
    );

    Ok(NextPeriodRecommendation {
        next_grant_date,
        next_purchase_date,
        reference_year,
        crosses_new_year,
        available_fmv: round_money(available_fmv),
        estimated_grant_price: round_money(input.current_price),
        estimated_discounted_price: round_money(estimated_discounted),
        estimated_max_shares: max_shares.round_dp(4),
        max_contribution_per_period: round_money(max_per_period),
        max_annual_contribution: round_money(max_annual),
        recommended_contribution_pct: recommended,
        current_contribution_pct: input.current_contribution_pct,
        current_contribution_per_period: round_money(current_per_period),
        current_within_estimate: current_per_period <= max_per_period,
        current_above_recommended: over_ceiling,
        is_estimate: true,
        basis: format!(
            "Estimate: assumes the next grant price stays near the current price of {}",
            round_money(input.current_price)
        ),
    })
}

fn validate_recommendation(input: &RecommendationInput) -> EsppResult<()> {
    validate_period_months(input.period_months)?;
    validate_pct("discount_rate_pct", input.discount_rate_pct)?;
    validate_pct("current_contribution_pct", input.current_contribution_pct)?;
    if input.annual_limit <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "annual_limit",
            "annual FMV limit must be > 0",
        ));
    }
    if input.remaining_limit < Decimal::ZERO {
        return Err(EsppError::invalid(
            "remaining_limit",
            "remaining limit must be >= 0",
        ));
    }
    if input.current_price <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "current_price",
            "current price must be > 0",
        ));
    }
    if input.annual_salary <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "annual_salary",
            "annual salary must be > 0",
        ));
    }
    if input.max_contribution_pct <= Decimal::ZERO || input.max_contribution_pct > Decimal::ONE_HUNDRED
    {
        return Err(EsppError::invalid(
            "max_contribution_pct",
            "maximum contribution must be in (0, 100]",
        ));
    }
    Ok(())
}
