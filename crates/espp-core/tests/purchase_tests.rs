use espp_core::purchase::{compute_purchase, PriceSide, PurchaseInput};
use espp_core::EsppError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn lookback(grant: Decimal, purchase: Decimal, contribution: Decimal) -> PurchaseInput {
    PurchaseInput {
        grant_price: grant,
        purchase_price: purchase,
        contribution,
        discount_rate_pct: dec!(15),
        has_lookback: true,
    }
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_rising_price_with_lookback() {
    let r = compute_purchase(&lookback(dec!(100), dec!(120), dec!(5000))).unwrap();
    assert_eq!(r.effective_price, dec!(100));
    assert_eq!(r.discounted_price, dec!(85));
    assert_eq!(r.whole_shares, 58);
    assert_eq!(r.cost_of_shares, dec!(4930.00));
    assert_eq!(r.cash_left_over, dec!(70.00));
    assert_eq!(r.total_proceeds, dec!(6960.00));
    assert_eq!(r.gain_dollars, dec!(2030.00));
    assert!(
        (r.gain_pct - dec!(41.17)).abs() < dec!(0.02),
        "Expected gain ~41.17%, got {}",
        r.gain_pct
    );
    assert_eq!(r.fmv_used, dec!(5800.00));
}

#[test]
fn test_falling_price_fmv_still_uses_grant() {
    let r = compute_purchase(&lookback(dec!(120), dec!(100), dec!(5000))).unwrap();
    assert_eq!(r.effective_price, dec!(100));
    assert_eq!(r.lookback_side, Some(PriceSide::Purchase));
    assert_eq!(r.discounted_price, dec!(85));
    assert_eq!(r.whole_shares, 58);
    assert_eq!(r.fmv_used, dec!(6960.00));
}

#[test]
fn test_no_lookback_no_discount() {
    let r = compute_purchase(&PurchaseInput {
        grant_price: dec!(100),
        purchase_price: dec!(120),
        contribution: dec!(1000),
        discount_rate_pct: Decimal::ZERO,
        has_lookback: false,
    })
    .unwrap();
    assert_eq!(r.discounted_price, dec!(120));
    assert_eq!(r.whole_shares, 8);
    assert_eq!(r.cash_left_over, dec!(40.00));
    assert_eq!(r.gain_dollars, Decimal::ZERO);
    assert_eq!(r.cost_of_shares, r.total_proceeds);
}

// ===========================================================================
// Properties over a grid of inputs
// ===========================================================================

fn grid() -> Vec<PurchaseInput> {
    let prices = [dec!(0.87), dec!(12.34), dec!(85), dec!(100), dec!(187.65), dec!(999.99)];
    let contributions = [dec!(0), dec!(50), dec!(1234.56), dec!(7500)];
    let discounts = [dec!(0), dec!(5), dec!(10), dec!(15)];
    let mut out = Vec::new();
    for g in prices {
        for p in prices {
            for c in contributions {
                for disc in discounts {
                    for lb in [true, false] {
                        out.push(PurchaseInput {
                            grant_price: g,
                            purchase_price: p,
                            contribution: c,
                            discount_rate_pct: disc,
                            has_lookback: lb,
                        });
                    }
                }
            }
        }
    }
    out
}

fn discounted(input: &PurchaseInput) -> Decimal {
    let effective = if input.has_lookback {
        input.grant_price.min(input.purchase_price)
    } else {
        input.purchase_price
    };
    effective * (Decimal::ONE - input.discount_rate_pct / dec!(100))
}

#[test]
fn test_whole_shares_and_left_over_bounds() {
    for input in grid() {
        let r = compute_purchase(&input).unwrap();
        let dp = discounted(&input);
        let expected = (input.contribution / dp).floor();
        assert_eq!(Decimal::from(r.whole_shares), expected, "{input:?}");
        let left = input.contribution - expected * dp;
        assert!(left >= Decimal::ZERO && left < dp, "{input:?}");
        assert!(r.cash_left_over >= Decimal::ZERO, "{input:?}");
    }
}

#[test]
fn test_effective_price_follows_lookback_flag() {
    for input in grid() {
        let r = compute_purchase(&input).unwrap();
        let expected = if input.has_lookback {
            input.grant_price.min(input.purchase_price)
        } else {
            input.purchase_price
        };
        assert_eq!(r.effective_price, expected.round_dp(2), "{input:?}");
    }
}

#[test]
fn test_fmv_is_shares_times_grant() {
    for input in grid() {
        let r = compute_purchase(&input).unwrap();
        let expected = (Decimal::from(r.whole_shares) * input.grant_price).round_dp(2);
        assert_eq!(r.fmv_used, expected, "{input:?}");
    }
}

#[test]
fn test_gain_non_negative_when_buying_below_market() {
    for input in grid() {
        if input.purchase_price < discounted(&input) {
            continue;
        }
        let r = compute_purchase(&input).unwrap();
        assert!(r.total_proceeds >= r.cost_of_shares, "{input:?}");
        assert!(r.gain_dollars >= Decimal::ZERO, "{input:?}");
    }
}

#[test]
fn test_identical_inputs_identical_outputs() {
    for input in grid().into_iter().step_by(7) {
        let a = compute_purchase(&input).unwrap();
        let b = compute_purchase(&input).unwrap();
        assert_eq!(a, b);
    }
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_invalid_input_fails_fast() {
    let cases = [
        lookback(dec!(0), dec!(100), dec!(100)),
        lookback(dec!(100), dec!(0), dec!(100)),
        lookback(dec!(100), dec!(100), dec!(-0.01)),
    ];
    for case in cases {
        assert!(matches!(
            compute_purchase(&case),
            Err(EsppError::InvalidInput { .. })
        ));
    }
}
