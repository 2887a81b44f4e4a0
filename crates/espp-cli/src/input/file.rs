use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use espp_core::market_data::{PriceHistory, PricePoint};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a JSON or YAML config file, picked by extension.
pub fn read_config<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = if has_extension(&canonical, &["yaml", "yml"]) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

#[derive(Deserialize)]
struct CloseRecord {
    date: NaiveDate,
    close: Decimal,
}

/// Read daily closes for `symbol` from a CSV (`date,close` header) or a JSON
/// array of `{"date", "close"}` objects.
pub fn read_price_history(
    path: &str,
    symbol: &str,
) -> Result<PriceHistory, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let points: Vec<PricePoint> = if has_extension(&canonical, &["csv"]) {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&canonical)
            .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
        let mut points = Vec::new();
        for (i, record) in rdr.deserialize::<CloseRecord>().enumerate() {
            let r = record.map_err(|e| {
                format!("Bad price row {} in '{}': {}", i + 2, canonical.display(), e)
            })?;
            points.push(PricePoint {
                date: r.date,
                close: r.close,
            });
        }
        points
    } else {
        read_json(path)?
    };
    log::debug!("loaded {} closes for {} from {}", points.len(), symbol, canonical.display());
    Ok(PriceHistory::new(symbol.to_uppercase(), points))
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    // Basic existence check
    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
