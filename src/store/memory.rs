use crate::core::record::Record;
use crate::core::store::{Query, RecordCollection};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory record collection backed by a vector.
pub struct MemoryCollection<R: Record> {
    inner: Arc<Mutex<Vec<R>>>,
}

impl<R: Record> MemoryCollection<R> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of records held, expired or not.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies ordering and limit to records that already passed `query.accepts`.
pub(crate) fn finish_query<R: Record>(mut records: Vec<R>, query: &Query<R>) -> Vec<R> {
    if query.is_newest_first() {
        records.sort_by_key(|r| std::cmp::Reverse(r.fetched_at()));
    } else {
        records.sort_by_key(|r| r.fetched_at());
    }
    if let Some(limit) = query.max_results() {
        records.truncate(limit);
    }
    records
}

#[async_trait]
impl<R: Record> RecordCollection<R> for MemoryCollection<R> {
    async fn put(&self, record: R) -> Result<()> {
        let mut records = self.inner.lock().await;
        debug!(collection = R::COLLECTION, "Store PUT");
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: Query<R>) -> Result<Vec<R>> {
        let now = Utc::now();
        let records = self.inner.lock().await;
        let matched: Vec<R> = records
            .iter()
            .filter(|r| query.accepts(r, now))
            .cloned()
            .collect();
        debug!(
            collection = R::COLLECTION,
            matched = matched.len(),
            "Store QUERY"
        );
        Ok(finish_query(matched, &query))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut records = self.inner.lock().await;
        let before = records.len();
        records.retain(|r| !r.is_expired(now));
        let removed = before - records.len();
        debug!(collection = R::COLLECTION, removed, "Store PURGE");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::CachedPricePoint;
    use chrono::Duration;

    fn point(coin_id: &str, price: f64, age: Duration) -> CachedPricePoint {
        CachedPricePoint {
            coin_id: coin_id.to_string(),
            price_usd: price,
            market_cap: 0.0,
            change_24h: 0.0,
            fetched_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn test_query_newest_first_with_limit() {
        let collection = MemoryCollection::<CachedPricePoint>::new();
        collection.put(point("bitcoin", 1.0, Duration::minutes(5))).await.unwrap();
        collection.put(point("bitcoin", 3.0, Duration::minutes(1))).await.unwrap();
        collection.put(point("bitcoin", 2.0, Duration::minutes(3))).await.unwrap();

        let results = collection
            .query(Query::all().newest_first().limit(2))
            .await
            .unwrap();
        let prices: Vec<f64> = results.iter().map(|p| p.price_usd).collect();
        assert_eq!(prices, vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn test_query_filters_by_predicate_and_time() {
        let collection = MemoryCollection::<CachedPricePoint>::new();
        collection.put(point("bitcoin", 1.0, Duration::minutes(1))).await.unwrap();
        collection.put(point("ethereum", 2.0, Duration::minutes(1))).await.unwrap();
        collection.put(point("bitcoin", 3.0, Duration::minutes(10))).await.unwrap();

        let results = collection
            .query(
                Query::all()
                    .matching(|p: &CachedPricePoint| p.coin_id == "bitcoin")
                    .since(Utc::now() - Duration::minutes(2)),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].price_usd, 1.0);
    }

    #[tokio::test]
    async fn test_expired_records_are_hidden_and_purged() {
        let collection = MemoryCollection::<CachedPricePoint>::new();
        collection.put(point("bitcoin", 1.0, Duration::minutes(31))).await.unwrap();
        collection.put(point("bitcoin", 2.0, Duration::minutes(1))).await.unwrap();

        // Still held, but never returned
        assert_eq!(collection.len().await, 2);
        let results = collection.query(Query::all()).await.unwrap();
        assert_eq!(results.len(), 1);

        let removed = collection.purge_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(collection.len().await, 1);
    }
}
