//! Record store abstractions

use crate::core::record::Record;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Selection over a record collection.
///
/// Records past their retention window never match, whether or not they have been purged yet.
pub struct Query<R> {
    predicate: Option<Predicate<R>>,
    fetched_since: Option<DateTime<Utc>>,
    newest_first: bool,
    limit: Option<usize>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            fetched_since: self.fetched_since,
            newest_first: self.newest_first,
            limit: self.limit,
        }
    }
}

impl<R: Record> Query<R> {
    pub fn all() -> Self {
        Self {
            predicate: None,
            fetched_since: None,
            newest_first: false,
            limit: None,
        }
    }

    pub fn matching(mut self, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Only records with `fetched_at >= since`.
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.fetched_since = Some(since);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fetched_since(&self) -> Option<DateTime<Utc>> {
        self.fetched_since
    }

    pub fn is_newest_first(&self) -> bool {
        self.newest_first
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Whether `record` satisfies the predicate, the time bound and the retention window.
    pub fn accepts(&self, record: &R, now: DateTime<Utc>) -> bool {
        if record.is_expired(now) {
            return false;
        }
        if let Some(since) = self.fetched_since
            && record.fetched_at() < since
        {
            return false;
        }
        self.predicate.as_ref().is_none_or(|p| p(record))
    }
}

/// Append-only collection of one record kind.
///
/// Errors returned here mean the store itself is unavailable; an empty result is `Ok(vec![])`.
#[async_trait]
pub trait RecordCollection<R: Record>: Send + Sync {
    async fn put(&self, record: R) -> Result<()>;

    async fn query(&self, query: Query<R>) -> Result<Vec<R>>;

    /// Deletes records past their retention window, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
