use super::util::{FEED_TIMEOUT, build_client, send};
use crate::core::upstream::{CoinQuote, PriceFeed, UpstreamError};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Price feed backed by CoinGecko's `simple/price` endpoint.
pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(FEED_TIMEOUT)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
}

#[async_trait]
impl PriceFeed for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoPriceFetch", skip(self), fields(coins = coin_ids.len()))]
    async fn fetch_prices(
        &self,
        coin_ids: &[String],
    ) -> Result<Vec<(String, CoinQuote)>, UpstreamError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/simple/price", self.base_url),
            &[
                ("ids", coin_ids.join(",").as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
                ("include_market_cap", "true"),
            ],
        )
        .map_err(|e| UpstreamError::Transport(format!("Invalid price API URL: {e}")))?;
        debug!("Requesting prices from {}", url);

        let response = send(self.client.get(url)).await?;
        let mut entries: HashMap<String, SimplePriceEntry> = response.json().await?;

        // Keep the caller's ordering; skip coins without a usable price
        let quotes = coin_ids
            .iter()
            .filter_map(|id| {
                let entry = entries.remove(id)?;
                let usd = entry.usd.filter(|p| p.is_finite() && *p >= 0.0)?;
                Some((
                    id.clone(),
                    CoinQuote {
                        usd,
                        usd_24h_change: entry.usd_24h_change,
                        usd_market_cap: entry.usd_market_cap,
                    },
                ))
            })
            .collect::<Vec<_>>();
        debug!(received = quotes.len(), "Received CoinGecko quotes");
        Ok(quotes)
    }
}
