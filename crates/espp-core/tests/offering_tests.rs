use chrono::{Datelike, Duration, NaiveDate, Weekday};
use espp_core::irs_limit::LimitState;
use espp_core::market_data::{
    CachedMarketData, PriceHistory, PricePoint, PurchasePriceSource, StaticMarketData,
};
use espp_core::offering::analyze_offering_from_source;
use espp_core::plan::{Participant, PlanConfig};
use espp_core::EsppError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday closes across 2024: 100 on the first trading day, rising one cent
/// per trading day.
fn year_of_closes() -> PriceHistory {
    let mut points = Vec::new();
    let mut date = d(2024, 1, 1);
    let mut close = dec!(100);
    while date.year() == 2024 {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            points.push(PricePoint { date, close });
            close += dec!(0.01);
        }
        date += Duration::days(1);
    }
    PriceHistory::new("ACME", points)
}

fn participant(prior: Decimal) -> Participant {
    Participant {
        annual_salary: dec!(150000),
        contribution_pct: dec!(10),
        prior_fmv_used: prior,
    }
}

#[test]
fn test_completed_period_from_history() {
    let source = StaticMarketData::new()
        .with_history(year_of_closes())
        .with_latest("ACME", dec!(105));
    let out = analyze_offering_from_source(
        &source,
        "ACME",
        PlanConfig::default(),
        participant(Decimal::ZERO),
        d(2024, 1, 1),
        d(2024, 8, 15),
    )
    .unwrap();
    let a = &out.result;

    assert_eq!(a.purchase_date, d(2024, 7, 1));
    assert_eq!(a.prices.grant_price, dec!(100));
    assert_eq!(a.prices.purchase_price_source, PurchasePriceSource::Historical);
    assert_eq!(a.prices.purchase_date_used, Some(d(2024, 7, 1)));
    assert!(a.prices.purchase_price > a.prices.grant_price);
    assert_eq!(a.contribution_per_period, dec!(7500));
    // Lookback keeps the grant price: 7500 / 85 = 88.2 shares
    assert_eq!(a.purchase.effective_price, dec!(100));
    assert_eq!(a.purchase.whole_shares, 88);
    assert_eq!(a.purchase.fmv_used, dec!(8800));
    assert_eq!(a.limit.remaining_limit, dec!(16200));
    assert_eq!(a.limit_state, LimitState::WithinLimit);
    assert!(a.recommendation.crosses_new_year);
    assert_eq!(a.recommendation.estimated_grant_price, dec!(105));
}

#[test]
fn test_in_progress_period_uses_live_price() {
    let source = CachedMarketData::new(
        StaticMarketData::new()
            .with_history(year_of_closes())
            .with_latest("ACME", dec!(90)),
    );
    let out = analyze_offering_from_source(
        &source,
        "ACME",
        PlanConfig::default(),
        participant(dec!(10000)),
        d(2024, 5, 1),
        d(2024, 6, 3),
    )
    .unwrap();
    let a = &out.result;
    assert_eq!(a.prices.purchase_price_source, PurchasePriceSource::CurrentLive);
    assert_eq!(a.prices.purchase_price, dec!(90));
    assert_eq!(a.purchase.effective_price, dec!(90));
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("has not been reached")));
}

#[test]
fn test_missing_grant_price_stops_analysis() {
    let source = StaticMarketData::new()
        .with_history(year_of_closes())
        .with_latest("ACME", dec!(105));
    let err = analyze_offering_from_source(
        &source,
        "ACME",
        PlanConfig::default(),
        participant(Decimal::ZERO),
        d(2022, 1, 3),
        d(2024, 8, 15),
    );
    assert!(matches!(err, Err(EsppError::PriceUnavailable { .. })));
}

#[test]
fn test_unknown_symbol_stops_analysis() {
    let source = StaticMarketData::new().with_history(year_of_closes());
    let err = analyze_offering_from_source(
        &source,
        "NOPE",
        PlanConfig::default(),
        participant(Decimal::ZERO),
        d(2024, 1, 2),
        d(2024, 8, 15),
    );
    assert!(err.is_err());
}

#[test]
fn test_envelope_carries_metadata() {
    let source = StaticMarketData::new().with_history(year_of_closes());
    let out = analyze_offering_from_source(
        &source,
        "ACME",
        PlanConfig {
            period_months: 3,
            ..PlanConfig::default()
        },
        participant(Decimal::ZERO),
        d(2024, 2, 1),
        d(2024, 9, 1),
    )
    .unwrap();
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.methodology.contains("ESPP"));
    assert_eq!(out.result.purchase_date, d(2024, 5, 1));
    let json = serde_json::to_value(&out).unwrap();
    assert!(json["result"]["limit"]["remaining_limit"].is_string());
}
