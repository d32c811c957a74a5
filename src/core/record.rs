//! Persisted cache record types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Display;
use std::str::FromStr;

/// A value that can live in a [`RecordCollection`](crate::core::store::RecordCollection).
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection (and fjall partition) holding this record kind.
    const COLLECTION: &'static str;

    /// How long a record is retained after `fetched_at`. `None` keeps it forever.
    fn retention() -> Option<Duration>;

    fn fetched_at(&self) -> DateTime<Utc>;

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        Self::retention().is_some_and(|retention| self.fetched_at() + retention <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsSource {
    #[serde(rename = "cryptopanic")]
    PrimaryApi,
    #[serde(rename = "fallback")]
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedNewsItem {
    pub id: String,
    pub source: NewsSource,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl Record for CachedNewsItem {
    const COLLECTION: &'static str = "news";

    fn retention() -> Option<Duration> {
        Some(Duration::hours(12))
    }

    fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPricePoint {
    pub coin_id: String,
    pub price_usd: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub change_24h: f64,
    pub fetched_at: DateTime<Utc>,
}

impl Record for CachedPricePoint {
    const COLLECTION: &'static str = "prices";

    fn retention() -> Option<Duration> {
        Some(Duration::minutes(30))
    }

    fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Dashboard card a vote refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    News,
    Price,
    Insight,
    Meme,
}

impl Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TargetType::News => "news",
                TargetType::Price => "price",
                TargetType::Insight => "insight",
                TargetType::Meme => "meme",
            }
        )
    }
}

impl FromStr for TargetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "news" => Ok(TargetType::News),
            "price" => Ok(TargetType::Price),
            "insight" => Ok(TargetType::Insight),
            "meme" => Ok(TargetType::Meme),
            _ => Err(anyhow::anyhow!("Invalid target type: {}", s)),
        }
    }
}

/// Thumbs up (`1`) or down (`-1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Vote {
    Up,
    Down,
}

impl From<Vote> for i8 {
    fn from(vote: Vote) -> i8 {
        match vote {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl TryFrom<i8> for Vote {
    type Error = anyhow::Error;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Vote::Up),
            -1 => Ok(Vote::Down),
            _ => Err(anyhow::anyhow!("Vote must be 1 or -1, got {}", value)),
        }
    }
}

impl FromStr for Vote {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "1" | "+1" => Ok(Vote::Up),
            "down" | "-1" => Ok(Vote::Down),
            _ => Err(anyhow::anyhow!("Vote must be up or down, got {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub vote: Vote,
    pub created_at: DateTime<Utc>,
}

impl Record for FeedbackRecord {
    const COLLECTION: &'static str = "feedback";

    fn retention() -> Option<Duration> {
        None
    }

    fn fetched_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
