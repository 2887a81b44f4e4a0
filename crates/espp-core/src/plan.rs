use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EsppError;
use crate::types::{
    Money, Percent, DEFAULT_ANNUAL_FMV_LIMIT, DEFAULT_APPROACHING_LIMIT_THRESHOLD,
    DEFAULT_MAX_CONTRIBUTION_PCT,
};
use crate::EsppResult;

/// Plan-level settings, shared by every participant in the plan.
///
/// Every field has a default so partial JSON/YAML plan files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub discount_rate_pct: Percent,
    pub has_lookback: bool,
    /// Offering period length; 3 and 6 are typical.
    pub period_months: u32,
    pub annual_fmv_limit: Money,
    pub max_contribution_pct: Percent,
    pub approaching_limit_threshold: Money,
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            discount_rate_pct: dec!(15),
            has_lookback: true,
            period_months: 6,
            annual_fmv_limit: DEFAULT_ANNUAL_FMV_LIMIT,
            max_contribution_pct: DEFAULT_MAX_CONTRIBUTION_PCT,
            approaching_limit_threshold: DEFAULT_APPROACHING_LIMIT_THRESHOLD,
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> EsppResult<()> {
        validate_pct("discount_rate_pct", self.discount_rate_pct)?;
        validate_period_months(self.period_months)?;
        if self.annual_fmv_limit <= Decimal::ZERO {
            return Err(EsppError::invalid(
                "annual_fmv_limit",
                "annual FMV limit must be > 0",
            ));
        }
        if self.max_contribution_pct <= Decimal::ZERO || self.max_contribution_pct > dec!(100) {
            return Err(EsppError::invalid(
                "max_contribution_pct",
                "maximum contribution must be in (0, 100]",
            ));
        }
        if self.approaching_limit_threshold < Decimal::ZERO {
            return Err(EsppError::invalid(
                "approaching_limit_threshold",
                "threshold must be >= 0",
            ));
        }
        Ok(())
    }
}

/// The employee's side of the calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub annual_salary: Money,
    pub contribution_pct: Percent,
    /// FMV already charged against this calendar year's limit.
    #[serde(default)]
    pub prior_fmv_used: Money,
}

impl Participant {
    pub fn validate(&self) -> EsppResult<()> {
        if self.annual_salary <= Decimal::ZERO {
            return Err(EsppError::invalid(
                "annual_salary",
                "annual salary must be > 0",
            ));
        }
        validate_pct("contribution_pct", self.contribution_pct)?;
        if self.prior_fmv_used < Decimal::ZERO {
            return Err(EsppError::invalid(
                "prior_fmv_used",
                "prior FMV used must be >= 0",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_pct(field: &str, pct: Percent) -> EsppResult<()> {
    if pct < Decimal::ZERO || pct > dec!(100) {
        return Err(EsppError::invalid(field, "percentage must be between 0 and 100"));
    }
    Ok(())
}

pub(crate) fn validate_period_months(months: u32) -> EsppResult<()> {
    if months == 0 || months > 12 {
        return Err(EsppError::invalid(
            "period_months",
            "offering period must be between 1 and 12 months",
        ));
    }
    Ok(())
}
