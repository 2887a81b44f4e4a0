use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EsppError;
use crate::plan::validate_pct;
use crate::types::{pct_to_fraction, round_money, Money, Percent};
use crate::EsppResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Pricing inputs for a single offering period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub grant_price: Money,
    pub purchase_price: Money,
    /// Payroll deductions accumulated over the period.
    pub contribution: Money,
    pub discount_rate_pct: Percent,
    pub has_lookback: bool,
}

/// Which price a lookback provision settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSide {
    Grant,
    Purchase,
}

/// Economics of one purchase. Money figures are rounded to cents; share
/// arithmetic runs on unrounded values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub effective_price: Money,
    /// Set only when the plan has a lookback provision.
    pub lookback_side: Option<PriceSide>,
    pub discounted_price: Money,
    pub max_shares_possible: Decimal,
    pub whole_shares: u64,
    pub cost_of_shares: Money,
    /// Refunded to the participant; always less than one discounted share.
    pub cash_left_over: Money,
    /// Market value of the shares at the purchase price.
    pub total_proceeds: Money,
    pub gain_dollars: Money,
    pub gain_pct: Percent,
    /// Shares x grant price, the figure charged against the IRS limit.
    pub fmv_used: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute how many whole shares a period's contributions buy and what
/// they are worth.
pub fn compute_purchase(input: &PurchaseInput) -> EsppResult<PurchaseResult> {
    validate(input)?;

    let (effective_price, lookback_side) = if input.has_lookback {
        // Ties go to the grant price.
        if input.grant_price <= input.purchase_price {
            (input.grant_price, Some(PriceSide::Grant))
        } else {
            (input.purchase_price, Some(PriceSide::Purchase))
        }
    } else {
        (input.purchase_price, None)
    };

    let discounted_price =
        effective_price * (Decimal::ONE - pct_to_fraction(input.discount_rate_pct));
    if discounted_price <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "discount_rate_pct",
            "a 100% discount leaves no purchase price to divide by",
        ));
    }

    let overflow = || EsppError::out_of_range("contribution");

    // Fractional shares are never purchased.
    let max_shares = input
        .contribution
        .checked_div(discounted_price)
        .ok_or_else(overflow)?;
    let whole = max_shares.floor();
    let whole_shares = whole
        .to_u64()
        .ok_or_else(|| EsppError::invalid("contribution", "share count out of range"))?;

    let cost_of_shares = whole.checked_mul(discounted_price).ok_or_else(overflow)?;
    let cash_left_over = input.contribution - cost_of_shares;
    let total_proceeds = whole
        .checked_mul(input.purchase_price)
        .ok_or_else(overflow)?;
    let gain_dollars = total_proceeds
        .checked_sub(cost_of_shares)
        .ok_or_else(overflow)?;
    let gain_pct = if cost_of_shares > Decimal::ZERO {
        gain_dollars
            .checked_div(cost_of_shares)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(overflow)?
    } else {
        Decimal::ZERO
    };
    let fmv_used = whole.checked_mul(input.grant_price).ok_or_else(overflow)?;

    debug!(
        "purchase: effective={effective_price} discounted={discounted_price} shares={whole_shares} fmv={fmv_used}"
    );

    Ok(PurchaseResult {
        effective_price: round_money(effective_price),
        lookback_side,
        discounted_price: round_money(discounted_price),
        max_shares_possible: max_shares.round_dp(4),
        whole_shares,
        cost_of_shares: round_money(cost_of_shares),
        cash_left_over: round_money(cash_left_over),
        total_proceeds: round_money(total_proceeds),
        gain_dollars: round_money(gain_dollars),
        gain_pct: round_money(gain_pct),
        fmv_used: round_money(fmv_used),
    })
}

fn validate(input: &PurchaseInput) -> EsppResult<()> {
    if input.grant_price <= Decimal::ZERO {
        return Err(EsppError::invalid("grant_price", "grant price must be > 0"));
    }
    if input.purchase_price <= Decimal::ZERO {
        return Err(EsppError::invalid(
            "purchase_price",
            "purchase price must be > 0",
        ));
    }
    if input.contribution < Decimal::ZERO {
        return Err(EsppError::invalid("contribution", "contribution must be >= 0"));
    }
    validate_pct("discount_rate_pct", input.discount_rate_pct)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
