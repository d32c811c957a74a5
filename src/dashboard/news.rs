//! Cache-first market news with fallback to older cached posts.

use crate::core::record::{CachedNewsItem, NewsSource};
use crate::core::store::{Query, RecordCollection};
use crate::core::upstream::{NewsFeed, NewsPost};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Most news items ever returned.
pub const MAX_ITEMS: usize = 5;

const SOURCE_NAME: &str = "CryptoPanic";
const POST_BASE_URL: &str = "https://cryptopanic.com/news";

/// News fetched within this window is served without calling upstream.
pub fn cache_ttl() -> Duration {
    Duration::minutes(30)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub tags: Vec<String>,
}

impl From<CachedNewsItem> for NewsItem {
    fn from(item: CachedNewsItem) -> Self {
        let summary = if item.summary.is_empty() {
            item.title.clone()
        } else {
            item.summary
        };
        Self {
            id: item.id,
            title: item.title,
            url: item.url,
            source: SOURCE_NAME.to_string(),
            published_at: item.created_at,
            summary,
            tags: item.tags,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn id_string(id: &serde_json::Value) -> Option<String> {
    match id {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(non_empty(value)?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Maps a raw post to a dashboard item. Posts without a title are dropped.
fn normalize_post(index: usize, post: &NewsPost, now: DateTime<Utc>) -> Option<NewsItem> {
    let title = non_empty(post.title.as_deref())?.to_string();
    let post_id = post.id.as_ref().and_then(id_string);

    let url = non_empty(post.original_url.as_deref())
        .or_else(|| non_empty(post.url.as_deref()))
        .map(str::to_string)
        .or_else(|| {
            non_empty(post.slug.as_deref())
                .map(str::to_string)
                .or_else(|| post_id.clone())
                .map(|slug| format!("{POST_BASE_URL}/{slug}/"))
        })
        .unwrap_or_default();

    let tags = post
        .instruments
        .iter()
        .filter_map(|i| non_empty(i.code.as_deref()).or_else(|| non_empty(i.title.as_deref())))
        .map(str::to_string)
        .collect();

    let source = post
        .source
        .as_ref()
        .and_then(|s| non_empty(s.title.as_deref()).or_else(|| non_empty(s.domain.as_deref())))
        .unwrap_or(SOURCE_NAME)
        .to_string();

    Some(NewsItem {
        id: match &post_id {
            Some(id) => format!("news-{id}"),
            None => format!("news-{index}"),
        },
        summary: non_empty(post.description.as_deref())
            .unwrap_or(&title)
            .to_string(),
        title,
        url,
        source,
        published_at: parse_time(post.published_at.as_deref())
            .or_else(|| parse_time(post.created_at.as_deref()))
            .unwrap_or(now),
        tags,
    })
}

fn has_valid_url(item: &NewsItem) -> bool {
    !item.url.is_empty() && item.url != "#"
}

pub struct NewsAggregator {
    store: Arc<dyn RecordCollection<CachedNewsItem>>,
    feed: Arc<dyn NewsFeed>,
}

impl NewsAggregator {
    pub fn new(store: Arc<dyn RecordCollection<CachedNewsItem>>, feed: Arc<dyn NewsFeed>) -> Self {
        Self { store, feed }
    }

    fn primary_query() -> Query<CachedNewsItem> {
        Query::all()
            .matching(|n: &CachedNewsItem| n.source == NewsSource::PrimaryApi)
            .newest_first()
            .limit(MAX_ITEMS)
    }

    async fn cached(&self, query: Query<CachedNewsItem>) -> Result<Vec<NewsItem>> {
        let records = self.store.query(query).await?;
        Ok(records.into_iter().map(NewsItem::from).collect())
    }

    /// Writes fresh items to the store. A failed write is logged and otherwise ignored.
    async fn persist(&self, items: &[NewsItem], fetched_at: DateTime<Utc>) {
        let writes = items.iter().filter(|item| has_valid_url(item)).map(|item| {
            let record = CachedNewsItem {
                id: uuid::Uuid::new_v4().simple().to_string(),
                source: NewsSource::PrimaryApi,
                title: item.title.clone(),
                url: item.url.clone(),
                summary: item.summary.clone(),
                tags: item.tags.clone(),
                created_at: item.published_at,
                fetched_at,
            };
            let store = Arc::clone(&self.store);
            async move {
                if let Err(e) = store.put(record).await {
                    warn!(error = %e, "Failed to cache news item");
                }
            }
        });
        join_all(writes).await;
    }

    /// Latest market news, at most [`MAX_ITEMS`].
    ///
    /// Upstream failures degrade to cached posts or an empty list; only store errors are returned.
    #[instrument(name = "NewsAggregator", skip(self))]
    pub async fn news(&self) -> Result<Vec<NewsItem>> {
        let now = Utc::now();

        let fresh = self
            .cached(Self::primary_query().since(now - cache_ttl()))
            .await?;
        if !fresh.is_empty() {
            debug!(count = fresh.len(), "Returning cached news");
            return Ok(fresh);
        }

        if !self.feed.is_configured() {
            warn!("No news API key configured, serving any cached news");
            return self.cached(Self::primary_query()).await;
        }

        // Read before calling upstream so a failure needs no second lookup
        let fallback = self.cached(Self::primary_query()).await?;

        match self.feed.fetch_hot().await {
            Ok(posts) => {
                let fetched_at = Utc::now();
                let items: Vec<NewsItem> = posts
                    .iter()
                    .enumerate()
                    .filter_map(|(index, post)| normalize_post(index, post, fetched_at))
                    .take(MAX_ITEMS)
                    .collect();
                debug!(received = posts.len(), kept = items.len(), "Fetched news");
                self.persist(&items, fetched_at).await;
                Ok(items)
            }
            Err(e) if e.is_rate_limit() => {
                warn!(cached = fallback.len(), "News API rate limit reached, using cached news");
                Ok(fallback)
            }
            Err(e) => {
                error!(error = %e, cached = fallback.len(), "News API failed, using cached news");
                Ok(fallback)
            }
        }
    }
}
