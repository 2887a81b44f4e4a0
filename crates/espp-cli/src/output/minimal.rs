use serde_json::Value;

use super::format_scalar;

/// Headline figure for each command, as a dotted path into the result.
/// The first path present wins.
const HEADLINES: &[&str] = &[
    // purchase
    "whole_shares",
    // analyze
    "purchase.whole_shares",
    // recommend
    "recommended_contribution_pct",
    // irs-limit
    "remaining_limit",
    // price-at
    "close",
];

/// Print only the headline figure, for use in shell pipelines.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = value.get("result").unwrap_or(value);
    HEADLINES
        .iter()
        .find_map(|path| lookup(result, path))
        .map(format_scalar)
        .unwrap_or_else(|| serde_json::to_string(result).unwrap_or_default())
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |v, key| v.get(key))
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_reads_analysis_envelope() {
        let v = json!({
            "result": {"purchase": {"whole_shares": 58}, "limit": {"remaining_limit": "19200"}},
            "warnings": []
        });
        assert_eq!(headline(&v), "58");
    }

    #[test]
    fn test_headline_prefers_recommendation_over_limit() {
        let v = json!({"recommended_contribution_pct": "11.3", "remaining_limit": "10000"});
        assert_eq!(headline(&v), "11.3");
    }

    #[test]
    fn test_headline_falls_back_to_compact_json() {
        let v = json!({"date": "2024-01-05"});
        assert_eq!(headline(&v), r#"{"date":"2024-01-05"}"#);
    }
}
