//! Thumbs up/down votes on dashboard items.

use crate::core::record::{FeedbackRecord, TargetType, Vote};
use crate::core::store::{Query, RecordCollection};
use anyhow::{Result, bail};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Created,
    Updated,
}

pub struct FeedbackService {
    store: Arc<dyn RecordCollection<FeedbackRecord>>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn RecordCollection<FeedbackRecord>>) -> Self {
        Self { store }
    }

    fn target_query(user_id: &str, target_type: TargetType, target_id: &str) -> Query<FeedbackRecord> {
        let (user_id, target_id) = (user_id.to_string(), target_id.to_string());
        Query::all()
            .matching(move |f: &FeedbackRecord| {
                f.user_id == user_id && f.target_type == target_type && f.target_id == target_id
            })
            .newest_first()
            .limit(1)
    }

    /// Records a vote. A later vote on the same item replaces the earlier one.
    pub async fn submit(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
        vote: Vote,
    ) -> Result<FeedbackStatus> {
        if user_id.trim().is_empty() || target_id.trim().is_empty() {
            bail!("Missing required fields");
        }

        let existing = self
            .store
            .query(Self::target_query(user_id, target_type, target_id))
            .await?;
        self.store
            .put(FeedbackRecord {
                user_id: user_id.to_string(),
                target_type,
                target_id: target_id.to_string(),
                vote,
                created_at: Utc::now(),
            })
            .await?;

        let status = if existing.is_empty() {
            FeedbackStatus::Created
        } else {
            FeedbackStatus::Updated
        };
        debug!(%target_type, target_id, ?vote, ?status, "Feedback saved");
        Ok(status)
    }

    /// The user's current vote on an item, if any.
    pub async fn current_vote(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<Option<Vote>> {
        let latest = self
            .store
            .query(Self::target_query(user_id, target_type, target_id))
            .await?;
        Ok(latest.first().map(|f| f.vote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;

    #[tokio::test]
    async fn test_vote_then_change_vote() {
        let store = Arc::new(MemoryCollection::<FeedbackRecord>::new());
        let service = FeedbackService::new(store.clone());

        let status = service
            .submit("alice", TargetType::News, "news-1", Vote::Up)
            .await
            .unwrap();
        assert_eq!(status, FeedbackStatus::Created);

        // Distinct timestamps keep "latest" unambiguous
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let status = service
            .submit("alice", TargetType::News, "news-1", Vote::Down)
            .await
            .unwrap();
        assert_eq!(status, FeedbackStatus::Updated);
        assert_eq!(
            service
                .current_vote("alice", TargetType::News, "news-1")
                .await
                .unwrap(),
            Some(Vote::Down)
        );
    }

    #[tokio::test]
    async fn test_votes_are_scoped_by_user_and_target() {
        let store = Arc::new(MemoryCollection::<FeedbackRecord>::new());
        let service = FeedbackService::new(store);

        service
            .submit("alice", TargetType::Price, "price-bitcoin", Vote::Up)
            .await
            .unwrap();
        let status = service
            .submit("bob", TargetType::Price, "price-bitcoin", Vote::Down)
            .await
            .unwrap();
        assert_eq!(status, FeedbackStatus::Created);
        let status = service
            .submit("alice", TargetType::Meme, "price-bitcoin", Vote::Down)
            .await
            .unwrap();
        assert_eq!(status, FeedbackStatus::Created);

        assert_eq!(
            service
                .current_vote("alice", TargetType::Price, "price-bitcoin")
                .await
                .unwrap(),
            Some(Vote::Up)
        );
        assert!(
            service
                .current_vote("carol", TargetType::Price, "price-bitcoin")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_missing_target_id_is_rejected() {
        let service = FeedbackService::new(Arc::new(MemoryCollection::<FeedbackRecord>::new()));
        let result = service.submit("alice", TargetType::Insight, " ", Vote::Up).await;
        assert!(result.unwrap_err().to_string().contains("Missing required fields"));
    }
}
