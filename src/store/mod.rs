pub mod disk;
pub mod memory;

use crate::core::record::{CachedNewsItem, CachedPricePoint, FeedbackRecord, Record};
use crate::core::store::RecordCollection;
use anyhow::{Context, Result};
use chrono::Utc;
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// The dashboard's persistent cache: one collection per record kind.
#[derive(Clone)]
pub struct RecordStore {
    pub news: Arc<dyn RecordCollection<CachedNewsItem>>,
    pub prices: Arc<dyn RecordCollection<CachedPricePoint>>,
    pub feedback: Arc<dyn RecordCollection<FeedbackRecord>>,
    // Keeps fjall's background workers alive for as long as the store is in use
    _keyspace: Option<Arc<Keyspace>>,
}

fn open_collection<R: Record>(keyspace: &Keyspace) -> Result<Arc<dyn RecordCollection<R>>> {
    let partition = keyspace
        .open_partition(R::COLLECTION, PartitionCreateOptions::default())
        .with_context(|| format!("Failed to open store partition: {}", R::COLLECTION))?;
    Ok(Arc::new(DiskCollection::<R>::new(partition)))
}

impl RecordStore {
    /// Opens (or creates) a fjall-backed store under `path`.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        debug!("Opened record store at {}", path.display());

        Ok(Self {
            news: open_collection(&keyspace)?,
            prices: open_collection(&keyspace)?,
            feedback: open_collection(&keyspace)?,
            _keyspace: Some(Arc::new(keyspace)),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            news: Arc::new(MemoryCollection::new()),
            prices: Arc::new(MemoryCollection::new()),
            feedback: Arc::new(MemoryCollection::new()),
            _keyspace: None,
        }
    }

    /// Assembles a store from arbitrary collections.
    pub fn from_collections(
        news: Arc<dyn RecordCollection<CachedNewsItem>>,
        prices: Arc<dyn RecordCollection<CachedPricePoint>>,
        feedback: Arc<dyn RecordCollection<FeedbackRecord>>,
    ) -> Self {
        Self {
            news,
            prices,
            feedback,
            _keyspace: None,
        }
    }

    /// Removes every record past its retention window.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let news = self.news.purge_expired(now).await?;
        let prices = self.prices.purge_expired(now).await?;
        let feedback = self.feedback.purge_expired(now).await?;
        debug!(news, prices, feedback, "Purged expired records");
        Ok(news + prices + feedback)
    }

    /// Runs [`purge_expired`](Self::purge_expired) every `interval`, starting one interval
    /// from now, until the handle is aborted.
    pub fn spawn_janitor(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                if let Err(e) = store.purge_expired().await {
                    error!(error = %e, "Periodic purge failed");
                }
            }
        })
    }
}
