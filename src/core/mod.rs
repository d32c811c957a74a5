//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod preferences;
pub mod record;
pub mod store;
pub mod upstream;

// Re-export main types for cleaner imports
pub use preferences::{InvestorType, Section, UserPreferences};
pub use record::{CachedNewsItem, CachedPricePoint, FeedbackRecord, NewsSource, Record, TargetType, Vote};
pub use store::{Query, RecordCollection};
pub use upstream::{
    CoinQuote, CompletionBackend, CompletionOutcome, CompletionRequest, NewsFeed, NewsPost,
    PriceFeed, UpstreamError,
};
