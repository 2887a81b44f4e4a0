//! Price lookups the calculators depend on.
//!
//! The calculators never fetch prices themselves. Callers supply a
//! [`MarketData`] source (an in-memory table, a file loaded by the CLI, or a
//! network client living outside this crate) and resolve the two prices an
//! offering period needs with [`resolve_period_prices`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::EsppError;
use crate::types::Money;
use crate::EsppResult;

/// Freshness window for cached quotes. Prices are near-real-time, so this
/// stays short.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Calendar days fetched either side of a target date so that weekends and
/// holidays still find a neighbouring close.
const LOOKUP_PADDING_DAYS: u64 = 7;

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Money,
}

/// Daily closes for one symbol, sorted by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Build a history from unordered points. When a date repeats, the last
    /// point for it wins.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let mut by_date: Vec<PricePoint> = Vec::with_capacity(points.len());
        let mut sorted = points;
        // Stable sort keeps input order within a date.
        sorted.sort_by_key(|p| p.date);
        for p in sorted {
            match by_date.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => by_date.push(p),
            }
        }
        PriceHistory {
            symbol: symbol.into(),
            points: by_date,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Points with `from <= date <= to`.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> PriceHistory {
        PriceHistory {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= from && p.date <= to)
                .copied()
                .collect(),
        }
    }

    /// Close of the trading day nearest `target`. Equidistant neighbours
    /// resolve to the earlier day.
    pub fn nearest(&self, target: NaiveDate) -> EsppResult<PricePoint> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(self.unavailable(target, "price history is empty")),
        };
        if target < first.date || target > last.date {
            return Err(self.unavailable(
                target,
                &format!("date outside available history {}..{}", first.date, last.date),
            ));
        }

        let idx = self.points.partition_point(|p| p.date < target);
        let after = self.points[idx];
        if after.date == target || idx == 0 {
            return Ok(after);
        }
        let before = self.points[idx - 1];
        if target - before.date <= after.date - target {
            Ok(before)
        } else {
            Ok(after)
        }
    }

    /// Like [`nearest`](Self::nearest), but a target anywhere in the
    /// requested window `from..=to` snaps to the closest available close,
    /// even past either end of the series.
    pub fn nearest_in_window(
        &self,
        target: NaiveDate,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EsppResult<PricePoint> {
        if target < from || target > to {
            return Err(self.unavailable(
                target,
                &format!("date outside requested range {from}..{to}"),
            ));
        }
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => self.nearest(target.clamp(first, last)),
            _ => Err(self.unavailable(target, "price history is empty")),
        }
    }

    fn unavailable(&self, date: NaiveDate, reason: &str) -> EsppError {
        EsppError::PriceUnavailable {
            symbol: self.symbol.clone(),
            when: date.to_string(),
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A provider of daily closes and live quotes.
pub trait MarketData {
    fn history(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> EsppResult<PriceHistory>;

    fn latest_price(&self, symbol: &str) -> EsppResult<Money>;
}

/// Prices held in memory, keyed by upper-cased symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    histories: HashMap<String, PriceHistory>,
    latest: HashMap<String, Money>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, history: PriceHistory) -> Self {
        self.histories.insert(history.symbol.to_uppercase(), history);
        self
    }

    pub fn with_latest(mut self, symbol: &str, price: Money) -> Self {
        self.latest.insert(symbol.to_uppercase(), price);
        self
    }
}

impl MarketData for StaticMarketData {
    fn history(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> EsppResult<PriceHistory> {
        self.histories
            .get(&symbol.to_uppercase())
            .map(|h| h.between(from, to))
            .ok_or_else(|| EsppError::PriceUnavailable {
                symbol: symbol.to_string(),
                when: format!("{from}..{to}"),
                reason: "no history for symbol".into(),
            })
    }

    fn latest_price(&self, symbol: &str) -> EsppResult<Money> {
        let key = symbol.to_uppercase();
        if let Some(price) = self.latest.get(&key) {
            return Ok(*price);
        }
        // Fall back to the most recent close.
        self.histories
            .get(&key)
            .and_then(|h| h.points().last())
            .map(|p| p.close)
            .ok_or_else(|| EsppError::PriceUnavailable {
                symbol: symbol.to_string(),
                when: "latest".into(),
                reason: "no current price for symbol".into(),
            })
    }
}

type HistoryKey = (String, NaiveDate, NaiveDate);

/// Wraps a source and reuses its answers for a short freshness window.
pub struct CachedMarketData<S> {
    inner: S,
    ttl: Duration,
    histories: Mutex<HashMap<HistoryKey, (Instant, PriceHistory)>>,
    latest: Mutex<HashMap<String, (Instant, Money)>>,
}

impl<S: MarketData> CachedMarketData<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        CachedMarketData {
            inner,
            ttl,
            histories: Mutex::new(HashMap::new()),
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: MarketData> MarketData for CachedMarketData<S> {
    fn history(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> EsppResult<PriceHistory> {
        let key = (symbol.to_uppercase(), from, to);
        if let Ok(cache) = self.histories.lock() {
            if let Some((at, h)) = cache.get(&key) {
                if at.elapsed() < self.ttl {
                    debug!("history cache hit for {} {}..{}", key.0, from, to);
                    return Ok(h.clone());
                }
            }
        }
        let fresh = self.inner.history(symbol, from, to)?;
        if let Ok(mut cache) = self.histories.lock() {
            cache.insert(key, (Instant::now(), fresh.clone()));
        }
        Ok(fresh)
    }

    fn latest_price(&self, symbol: &str) -> EsppResult<Money> {
        let key = symbol.to_uppercase();
        if let Ok(cache) = self.latest.lock() {
            if let Some((at, price)) = cache.get(&key) {
                if at.elapsed() < self.ttl {
                    return Ok(*price);
                }
            }
        }
        let price = self.inner.latest_price(symbol)?;
        if let Ok(mut cache) = self.latest.lock() {
            cache.insert(key, (Instant::now(), price));
        }
        Ok(price)
    }
}

// ---------------------------------------------------------------------------
// Period price resolution
// ---------------------------------------------------------------------------

/// Where the purchase price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchasePriceSource {
    Historical,
    /// The purchase date has not happened yet; the live price stands in.
    CurrentLive,
}

/// The two prices an offering period needs, with the trading days used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPrices {
    pub grant_price: Money,
    pub grant_date_used: NaiveDate,
    pub purchase_price: Money,
    /// `None` when the live price was used.
    pub purchase_date_used: Option<NaiveDate>,
    pub purchase_price_source: PurchasePriceSource,
}

/// Resolve grant and purchase prices for a period as of `as_of`.
///
/// A missing grant price is a hard error. A purchase date on or after
/// `as_of` takes the current live price. Dates are matched within the padded
/// fetch window, so a weekend purchase resolved before the next trading day
/// settles on the preceding close.
pub fn resolve_period_prices(
    source: &dyn MarketData,
    symbol: &str,
    grant_date: NaiveDate,
    purchase_date: NaiveDate,
    as_of: NaiveDate,
) -> EsppResult<PeriodPrices> {
    if purchase_date < grant_date {
        return Err(EsppError::invalid(
            "purchase_date",
            "purchase date must not precede the grant date",
        ));
    }

    let from = grant_date
        .checked_sub_days(Days::new(LOOKUP_PADDING_DAYS))
        .unwrap_or(grant_date);
    let to = purchase_date
        .checked_add_days(Days::new(LOOKUP_PADDING_DAYS))
        .unwrap_or(purchase_date)
        .min(as_of);
    let history = source.history(symbol, from, to)?;
    let grant = history.nearest_in_window(grant_date, from, to)?;

    let (purchase_price, purchase_date_used, purchase_price_source) = if purchase_date >= as_of {
        warn!("{symbol}: purchase date {purchase_date} not reached, using live price");
        let live = source.latest_price(symbol)?;
        (live, None, PurchasePriceSource::CurrentLive)
    } else {
        let p = history.nearest_in_window(purchase_date, from, to)?;
        (p.close, Some(p.date), PurchasePriceSource::Historical)
    };

    Ok(PeriodPrices {
        grant_price: grant.close,
        grant_date_used: grant.date,
        purchase_price,
        purchase_date_used,
        purchase_price_source,
    })
}
