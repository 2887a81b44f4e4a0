//! Offering period calendar: purchase dates and per-period contributions.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EsppError;
use crate::plan::validate_period_months;
use crate::types::{pct_to_fraction, Money, Percent};
use crate::EsppResult;

/// One offering period, anchored at its grant (offering) date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferingPeriod {
    pub grant_date: NaiveDate,
    pub period_months: u32,
}

impl OfferingPeriod {
    pub fn new(grant_date: NaiveDate, period_months: u32) -> EsppResult<Self> {
        validate_period_months(period_months)?;
        Ok(OfferingPeriod {
            grant_date,
            period_months,
        })
    }

    pub fn purchase_date(&self) -> EsppResult<NaiveDate> {
        purchase_date(self.grant_date, self.period_months)
    }

    /// The period that starts on this period's purchase date.
    pub fn next(&self) -> EsppResult<OfferingPeriod> {
        Ok(OfferingPeriod {
            grant_date: self.purchase_date()?,
            period_months: self.period_months,
        })
    }
}

/// Purchase date of a period starting on `grant_date`.
///
/// Calendar-month arithmetic: a grant on Aug 31 with a 6-month period
/// purchases on the last day of February.
pub fn purchase_date(grant_date: NaiveDate, period_months: u32) -> EsppResult<NaiveDate> {
    validate_period_months(period_months)?;
    grant_date
        .checked_add_months(Months::new(period_months))
        .ok_or_else(|| {
            EsppError::DateError(format!(
                "{grant_date} + {period_months} months is out of range"
            ))
        })
}

/// Number of offering periods per year (`12 / period_months`). Not
/// necessarily whole for unusual period lengths.
pub fn periods_per_year(period_months: u32) -> EsppResult<Decimal> {
    validate_period_months(period_months)?;
    Ok(Decimal::from(12) / Decimal::from(period_months))
}

/// Payroll deductions accumulated over one offering period.
pub fn contribution_per_period(
    annual_salary: Money,
    contribution_pct: Percent,
    period_months: u32,
) -> EsppResult<Money> {
    let periods = periods_per_year(period_months)?;
    annual_salary
        .checked_mul(pct_to_fraction(contribution_pct))
        .and_then(|annual| annual.checked_div(periods))
        .ok_or_else(|| EsppError::out_of_range("annual_salary"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_six_month_purchase_date() {
        assert_eq!(purchase_date(d(2024, 1, 15), 6).unwrap(), d(2024, 7, 15));
    }

    #[test]
    fn test_purchase_date_clamps_to_month_end() {
        assert_eq!(purchase_date(d(2023, 8, 31), 6).unwrap(), d(2024, 2, 29));
        assert_eq!(purchase_date(d(2024, 11, 30), 3).unwrap(), d(2025, 2, 28));
    }

    #[test]
    fn test_zero_month_period_rejected() {
        assert!(purchase_date(d(2024, 1, 1), 0).is_err());
        assert!(OfferingPeriod::new(d(2024, 1, 1), 0).is_err());
    }

    #[test]
    fn test_next_period_starts_on_purchase_date() {
        let period = OfferingPeriod::new(d(2024, 5, 1), 6).unwrap();
        let next = period.next().unwrap();
        assert_eq!(next.grant_date, d(2024, 11, 1));
        assert_eq!(next.purchase_date().unwrap(), d(2025, 5, 1));
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(periods_per_year(6).unwrap(), dec!(2));
        assert_eq!(periods_per_year(3).unwrap(), dec!(4));
    }

    #[test]
    fn test_contribution_per_period() {
        // 150k * 10% = 15k a year, two periods
        let c = contribution_per_period(dec!(150_000), dec!(10), 6).unwrap();
        assert_eq!(c, dec!(7500));
        let q = contribution_per_period(dec!(150_000), dec!(10), 3).unwrap();
        assert_eq!(q, dec!(3750));
    }
}
