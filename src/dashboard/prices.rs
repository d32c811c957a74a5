//! Cache-first coin price resolution.

use crate::core::record::CachedPricePoint;
use crate::core::store::{Query, RecordCollection};
use crate::core::upstream::PriceFeed;
use anyhow::Result;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Coins shown when the user has not picked any.
pub const DEFAULT_COINS: &[&str] = &["bitcoin", "ethereum"];

/// Prices fetched within this window are served without calling upstream.
pub fn cache_ttl() -> Duration {
    Duration::minutes(2)
}

/// A coin price as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub id: String,
    pub coin_id: String,
    pub name: String,
    pub price: f64,
    pub change24h: f64,
    pub market_cap: f64,
}

impl From<&CachedPricePoint> for PriceItem {
    fn from(point: &CachedPricePoint) -> Self {
        Self {
            id: format!("price-{}", point.coin_id),
            coin_id: point.coin_id.clone(),
            name: capitalize(&point.coin_id),
            price: point.price_usd,
            change24h: point.change_24h,
            market_cap: point.market_cap,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Requested ids in order, without duplicates; empty input means [`DEFAULT_COINS`].
fn requested_ids(assets: &[String]) -> Vec<String> {
    if assets.is_empty() {
        return DEFAULT_COINS.iter().map(|c| c.to_string()).collect();
    }
    let mut seen = HashSet::new();
    assets
        .iter()
        .filter(|a| seen.insert(a.as_str()))
        .cloned()
        .collect()
}

/// Keeps the newest point per coin. `points` must be sorted newest first.
fn latest_per_coin(points: Vec<CachedPricePoint>) -> HashMap<String, CachedPricePoint> {
    let mut latest = HashMap::new();
    for point in points {
        latest.entry(point.coin_id.clone()).or_insert(point);
    }
    latest
}

fn normalize(ids: &[String], points: &HashMap<String, CachedPricePoint>) -> Vec<PriceItem> {
    ids.iter()
        .filter_map(|id| points.get(id))
        .map(PriceItem::from)
        .collect()
}

pub struct PriceAggregator {
    store: Arc<dyn RecordCollection<CachedPricePoint>>,
    feed: Arc<dyn PriceFeed>,
}

impl PriceAggregator {
    pub fn new(store: Arc<dyn RecordCollection<CachedPricePoint>>, feed: Arc<dyn PriceFeed>) -> Self {
        Self { store, feed }
    }

    fn query_for(ids: &[String]) -> Query<CachedPricePoint> {
        let wanted: HashSet<String> = ids.iter().cloned().collect();
        Query::all()
            .matching(move |p: &CachedPricePoint| wanted.contains(&p.coin_id))
            .newest_first()
    }

    /// Resolves current prices for `assets`.
    ///
    /// Upstream failures fall back to whatever is cached; only store errors are returned.
    #[instrument(name = "PriceAggregator", skip(self))]
    pub async fn prices(&self, assets: &[String]) -> Result<Vec<PriceItem>> {
        let ids = requested_ids(assets);
        let now = Utc::now();

        let fresh = self
            .store
            .query(Self::query_for(&ids).since(now - cache_ttl()))
            .await?;
        let mut latest = latest_per_coin(fresh);

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !latest.contains_key(*id))
            .cloned()
            .collect();
        debug!(cached = latest.len(), missing = ?missing, "Price cache lookup");

        if missing.is_empty() {
            return Ok(normalize(&ids, &latest));
        }

        match self.feed.fetch_prices(&missing).await {
            Ok(quotes) => {
                let fetched_at = Utc::now();
                for (coin_id, quote) in quotes {
                    let point = CachedPricePoint {
                        coin_id: coin_id.clone(),
                        price_usd: quote.usd,
                        market_cap: quote.usd_market_cap.unwrap_or(0.0),
                        change_24h: quote.usd_24h_change.unwrap_or(0.0),
                        fetched_at,
                    };
                    self.store.put(point.clone()).await?;
                    latest.insert(coin_id, point);
                }
                Ok(normalize(&ids, &latest))
            }
            Err(e) => {
                if e.is_rate_limit() {
                    warn!("Price API rate limit reached, using cached prices");
                } else {
                    warn!(error = %e, "Price API failed, using cached prices");
                }
                let any_cached = self.store.query(Self::query_for(&ids)).await?;
                let fallback = latest_per_coin(any_cached);
                debug!(count = fallback.len(), "Returning fallback prices");
                Ok(normalize(&ids, &fallback))
            }
        }
    }
}
