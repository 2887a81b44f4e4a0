use chrono::NaiveDate;
use espp_core::irs_limit::{
    compute_limit_status, recommend_next_period, LimitState, RecommendationInput,
};
use espp_core::DEFAULT_ANNUAL_FMV_LIMIT;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Limit status
// ===========================================================================

#[test]
fn test_overage_reported_through_total_not_remaining() {
    let s = compute_limit_status(dec!(20000), dec!(6000), dec!(25000)).unwrap();
    assert_eq!(s.total_fmv_used, dec!(26000));
    assert_eq!(s.remaining_limit, Decimal::ZERO);
    assert!(s.total_fmv_used > s.annual_limit);
    assert_eq!(s.overage, dec!(1000));
    assert_eq!(s.state(dec!(5000)), LimitState::OverLimit);
}

#[test]
fn test_remaining_never_negative() {
    let amounts = [dec!(0), dec!(0.01), dec!(4999.99), dec!(12500), dec!(25000), dec!(60000)];
    for prior in amounts {
        for this in amounts {
            let s = compute_limit_status(prior, this, DEFAULT_ANNUAL_FMV_LIMIT).unwrap();
            assert!(s.remaining_limit >= Decimal::ZERO);
            assert_eq!(
                s.remaining_limit,
                (DEFAULT_ANNUAL_FMV_LIMIT - prior - this).max(Decimal::ZERO)
            );
            assert!(s.usage_pct <= dec!(100));
        }
    }
}

#[test]
fn test_limit_is_configurable() {
    let s = compute_limit_status(dec!(10000), dec!(10000), dec!(30000)).unwrap();
    assert_eq!(s.remaining_limit, dec!(10000));
    assert!(!s.over_limit);
}

// ===========================================================================
// Recommendation
// ===========================================================================

fn quarterly(purchase_date: NaiveDate, remaining: Decimal) -> RecommendationInput {
    RecommendationInput {
        purchase_date,
        period_months: 3,
        remaining_limit: remaining,
        annual_limit: dec!(25000),
        current_price: dec!(50),
        discount_rate_pct: dec!(15),
        annual_salary: dec!(200000),
        current_contribution_pct: dec!(15),
        max_contribution_pct: dec!(15),
    }
}

#[test]
fn test_quarterly_same_year_estimate() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let r = recommend_next_period(&quarterly(date, dec!(5000))).unwrap();
    assert_eq!(r.next_purchase_date, NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    assert!(!r.crosses_new_year);
    // 100 shares * 42.50 = 4250 per quarter, 17000 a year = 8.5%
    assert_eq!(r.max_contribution_per_period, dec!(4250));
    assert_eq!(r.recommended_contribution_pct, dec!(8.5));
    // 15% of 200k is 7500 a quarter
    assert_eq!(r.current_contribution_per_period, dec!(7500));
    assert!(!r.current_within_estimate);
}

#[test]
fn test_quarterly_year_end_rollover() {
    let date = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
    let r = recommend_next_period(&quarterly(date, Decimal::ZERO)).unwrap();
    assert!(r.crosses_new_year);
    assert_eq!(r.available_fmv, dec!(25000));
    assert!(r.recommended_contribution_pct > Decimal::ZERO);
    assert!(r.recommended_contribution_pct <= dec!(15));
    assert!(r.is_estimate);
}

#[test]
fn test_recommendation_never_exceeds_ceiling() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    for remaining in [dec!(0), dec!(100), dec!(10000), dec!(25000)] {
        for price in [dec!(1), dec!(50), dec!(5000)] {
            let mut input = quarterly(date, remaining);
            input.current_price = price;
            let r = recommend_next_period(&input).unwrap();
            assert!(r.recommended_contribution_pct >= Decimal::ZERO);
            assert!(r.recommended_contribution_pct <= input.max_contribution_pct);
        }
    }
}
