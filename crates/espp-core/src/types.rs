use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages on a 0-100 scale (15 = 15%), the way plan documents quote
/// discounts and contribution rates.
pub type Percent = Decimal;

/// Statutory annual FMV ceiling for Section 423 plans at the time of writing.
pub const DEFAULT_ANNUAL_FMV_LIMIT: Money = dec!(25000);

/// Plan-design ceiling on payroll contributions.
pub const DEFAULT_MAX_CONTRIBUTION_PCT: Percent = dec!(15);

/// Remaining headroom below which the limit counts as "approaching".
pub const DEFAULT_APPROACHING_LIMIT_THRESHOLD: Money = dec!(5000);

/// Round a monetary figure for presentation.
pub fn round_money(value: Decimal) -> Money {
    value.round_dp(2)
}

/// Convert a percentage to a multiplier (15 -> 0.15).
pub fn pct_to_fraction(pct: Percent) -> Decimal {
    pct / dec!(100)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
