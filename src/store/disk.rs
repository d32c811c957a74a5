use super::memory::finish_query;
use crate::core::record::Record;
use crate::core::store::{Query, RecordCollection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::PartitionHandle;
use std::marker::PhantomData;
use tracing::debug;

/// Record collection stored in a fjall partition.
///
/// Keys are the big-endian `fetched_at` in microseconds followed by eight random bytes, so key
/// order is fetch order and two writes in the same microsecond never collide.
pub struct DiskCollection<R: Record> {
    partition: PartitionHandle,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> DiskCollection<R> {
    pub fn new(partition: PartitionHandle) -> Self {
        Self {
            partition,
            _marker: PhantomData,
        }
    }
}

fn time_prefix(at: DateTime<Utc>) -> [u8; 8] {
    // Pre-epoch timestamps clamp to zero
    (at.timestamp_micros().max(0) as u64).to_be_bytes()
}

fn record_key(at: DateTime<Utc>) -> Vec<u8> {
    let mut key = time_prefix(at).to_vec();
    key.extend_from_slice(&rand::random::<[u8; 8]>());
    key
}

fn scan<R: Record>(partition: &PartitionHandle, query: &Query<R>) -> Result<Vec<R>> {
    let now = Utc::now();
    let mut lower = query.fetched_since().map(time_prefix).unwrap_or([0u8; 8]);
    if let Some(retention) = R::retention() {
        lower = lower.max(time_prefix(now - retention));
    }

    let iter = partition.range(lower.to_vec()..);
    let matched = if query.is_newest_first() {
        collect_matching(iter.rev(), query, now)?
    } else {
        collect_matching(iter, query, now)?
    };
    Ok(finish_query(matched, query))
}

fn collect_matching<R, I, K, V, E>(iter: I, query: &Query<R>, now: DateTime<Utc>) -> Result<Vec<R>>
where
    R: Record,
    I: Iterator<Item = std::result::Result<(K, V), E>>,
    V: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut matched = Vec::new();
    for item in iter {
        let (_, value) = item.context("Failed to read record from store")?;
        let record: R = match serde_json::from_slice(value.as_ref()) {
            Ok(record) => record,
            Err(e) => {
                debug!(collection = R::COLLECTION, error = %e, "Skipping undecodable record");
                continue;
            }
        };
        if query.accepts(&record, now) {
            matched.push(record);
            // Keys are already in the requested order
            if query.max_results().is_some_and(|limit| matched.len() >= limit) {
                break;
            }
        }
    }
    Ok(matched)
}

fn purge<R: Record>(partition: &PartitionHandle, now: DateTime<Utc>) -> Result<usize> {
    let Some(retention) = R::retention() else {
        return Ok(0);
    };
    let cutoff = time_prefix(now - retention);
    let keys = partition
        .range(..cutoff.to_vec())
        .map(|item| item.map(|(key, _)| key))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to scan expired records")?;
    for key in &keys {
        partition
            .remove(key.to_vec())
            .context("Failed to remove expired record")?;
    }
    Ok(keys.len())
}

#[async_trait]
impl<R: Record> RecordCollection<R> for DiskCollection<R> {
    async fn put(&self, record: R) -> Result<()> {
        let partition = self.partition.clone();
        let key = record_key(record.fetched_at());
        let value = serde_json::to_vec(&record)?;
        tokio::task::spawn_blocking(move || partition.insert(key, value))
            .await
            .context("Store write task failed")?
            .context("Failed to write record to store")?;
        debug!(collection = R::COLLECTION, "Store PUT");
        Ok(())
    }

    async fn query(&self, query: Query<R>) -> Result<Vec<R>> {
        let partition = self.partition.clone();
        let records = tokio::task::spawn_blocking(move || scan(&partition, &query))
            .await
            .context("Store query task failed")??;
        debug!(
            collection = R::COLLECTION,
            matched = records.len(),
            "Store QUERY"
        );
        Ok(records)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let partition = self.partition.clone();
        let removed = tokio::task::spawn_blocking(move || purge::<R>(&partition, now))
            .await
            .context("Store purge task failed")??;
        debug!(collection = R::COLLECTION, removed, "Store PURGE");
        Ok(removed)
    }
}
