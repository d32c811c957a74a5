//! Dashboard assembly: the aggregators and the composer that runs them together.

pub mod insight;
pub mod meme;
pub mod news;
pub mod prices;

use crate::core::preferences::{PreferencesEcho, UserPreferences};
use crate::core::upstream::{CompletionBackend, NewsFeed, PriceFeed};
use crate::store::RecordStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use insight::{Insight, InsightGenerator};
use meme::Meme;
use news::{NewsAggregator, NewsItem};
use prices::{PriceAggregator, PriceItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Everything a client needs to render one dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub news: Vec<NewsItem>,
    pub prices: Vec<PriceItem>,
    pub insight: Insight,
    pub meme: Meme,
    pub preferences: PreferencesEcho,
    pub updated_at: DateTime<Utc>,
}

pub struct Dashboard {
    news: Arc<NewsAggregator>,
    prices: Arc<PriceAggregator>,
    insight: Arc<InsightGenerator>,
}

impl Dashboard {
    pub fn new(
        store: &RecordStore,
        price_feed: Arc<dyn PriceFeed>,
        news_feed: Arc<dyn NewsFeed>,
        backend: Option<Arc<dyn CompletionBackend>>,
        models: Vec<String>,
    ) -> Self {
        Self {
            news: Arc::new(NewsAggregator::new(Arc::clone(&store.news), news_feed)),
            prices: Arc::new(PriceAggregator::new(Arc::clone(&store.prices), price_feed)),
            insight: Arc::new(InsightGenerator::new(backend, models)),
        }
    }

    pub async fn prices(&self, assets: &[String]) -> Result<Vec<PriceItem>> {
        self.prices.prices(assets).await
    }

    pub async fn news(&self) -> Result<Vec<NewsItem>> {
        self.news.news().await
    }

    pub async fn insight(&self, prefs: &UserPreferences) -> Insight {
        self.insight.generate(prefs).await
    }

    /// Fetches news, prices and the insight concurrently and assembles the payload.
    ///
    /// Each part runs as its own task and all three are awaited before any error is reported.
    /// Only store failures surface here; upstream problems are absorbed by the aggregators.
    #[instrument(name = "Dashboard", skip_all)]
    pub async fn fetch(&self, prefs: &UserPreferences) -> Result<DashboardPayload> {
        let news_task = tokio::spawn({
            let news = Arc::clone(&self.news);
            async move { news.news().await }
        });
        let prices_task = tokio::spawn({
            let prices = Arc::clone(&self.prices);
            let assets = prefs.assets.clone();
            async move { prices.prices(&assets).await }
        });
        let insight_task = tokio::spawn({
            let insight = Arc::clone(&self.insight);
            let prefs = prefs.clone();
            async move { insight.generate(&prefs).await }
        });
        let meme = meme::random_meme();

        let (news, prices, insight) = tokio::join!(news_task, prices_task, insight_task);
        let news = news
            .context("News task failed")?
            .context("Failed to load news")?;
        let prices = prices
            .context("Price task failed")?
            .context("Failed to load prices")?;
        let insight = insight.context("Insight task failed")?;

        debug!(news = news.len(), prices = prices.len(), "Dashboard assembled");
        Ok(DashboardPayload {
            news,
            prices,
            insight,
            meme,
            preferences: PreferencesEcho::from(prefs),
            updated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{CachedNewsItem, CachedPricePoint, FeedbackRecord};
    use crate::core::store::{Query, RecordCollection};
    use crate::core::upstream::{CoinQuote, NewsPost, UpstreamError};
    use crate::store::memory::MemoryCollection;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct DownPriceFeed;

    #[async_trait]
    impl PriceFeed for DownPriceFeed {
        async fn fetch_prices(
            &self,
            _coin_ids: &[String],
        ) -> Result<Vec<(String, CoinQuote)>, UpstreamError> {
            Err(UpstreamError::Transport("connection refused".to_string()))
        }
    }

    /// Records that it was called so sibling completion can be checked.
    struct DownNewsFeed {
        called: AtomicBool,
    }

    #[async_trait]
    impl NewsFeed for DownNewsFeed {
        fn is_configured(&self) -> bool {
            true
        }

        async fn fetch_hot(&self) -> Result<Vec<NewsPost>, UpstreamError> {
            self.called.store(true, Ordering::SeqCst);
            Err(UpstreamError::Status(502))
        }
    }

    struct BrokenCollection;

    #[async_trait]
    impl RecordCollection<CachedPricePoint> for BrokenCollection {
        async fn put(&self, _record: CachedPricePoint) -> Result<()> {
            anyhow::bail!("store unreachable")
        }

        async fn query(&self, _query: Query<CachedPricePoint>) -> Result<Vec<CachedPricePoint>> {
            anyhow::bail!("store unreachable")
        }

        async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
            anyhow::bail!("store unreachable")
        }
    }

    #[tokio::test]
    async fn test_upstream_outage_still_renders() {
        let store = RecordStore::in_memory();
        let dashboard = Dashboard::new(
            &store,
            Arc::new(DownPriceFeed),
            Arc::new(DownNewsFeed {
                called: AtomicBool::new(false),
            }),
            None,
            vec![],
        );
        let prefs = UserPreferences {
            assets: vec!["bitcoin".to_string()],
            investor_type: None,
            content_types: vec!["Charts".to_string()],
        };

        let payload = dashboard.fetch(&prefs).await.unwrap();
        assert!(payload.news.is_empty());
        assert!(payload.prices.is_empty());
        assert!(payload.insight.text.contains("bitcoin"));
        assert!(!payload.meme.id.is_empty());
        assert_eq!(payload.preferences.content_types, vec!["Charts"]);

        let json = serde_json::to_value(&payload).unwrap();
        for key in ["news", "prices", "insight", "meme", "preferences", "updatedAt"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["insight"].get("generatedAt").is_some());
    }

    #[tokio::test]
    async fn test_store_failure_fails_dashboard_after_siblings_finish() {
        let store = RecordStore::from_collections(
            Arc::new(MemoryCollection::<CachedNewsItem>::new()),
            Arc::new(BrokenCollection),
            Arc::new(MemoryCollection::<FeedbackRecord>::new()),
        );
        let news_feed = Arc::new(DownNewsFeed {
            called: AtomicBool::new(false),
        });
        let dashboard = Dashboard::new(&store, Arc::new(DownPriceFeed), news_feed.clone(), None, vec![]);

        let result = dashboard.fetch(&UserPreferences::default()).await;
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("store unreachable"));
        assert!(news_feed.called.load(Ordering::SeqCst));
    }
}
