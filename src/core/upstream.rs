//! Contracts for the third-party services feeding the dashboard

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Why a call to an upstream API did not produce usable data.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("upstream rejected credentials")]
    Unauthorized,
    #[error("upstream requires payment or quota is exhausted")]
    PaymentRequired,
    #[error("upstream resource not found")]
    NotFound,
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => UpstreamError::Unauthorized,
            402 => UpstreamError::PaymentRequired,
            404 => UpstreamError::NotFound,
            429 => UpstreamError::RateLimited,
            other => UpstreamError::Status(other),
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, UpstreamError::RateLimited)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return UpstreamError::from_status(status.as_u16());
        }
        if err.is_decode() {
            return UpstreamError::Malformed(err.to_string());
        }
        UpstreamError::Transport(err.to_string())
    }
}

/// Price data for one coin, as reported by the price API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoinQuote {
    pub usd: f64,
    pub usd_24h_change: Option<f64>,
    pub usd_market_cap: Option<f64>,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetches quotes for `coin_ids` in one request. Unknown ids are simply absent.
    async fn fetch_prices(&self, coin_ids: &[String]) -> Result<Vec<(String, CoinQuote)>, UpstreamError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInstrument {
    pub code: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostSource {
    pub title: Option<String>,
    pub domain: Option<String>,
}

/// A raw post from the news API. Every field is optional; normalization decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsPost {
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub original_url: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub instruments: Vec<PostInstrument>,
    pub source: Option<PostSource>,
    pub published_at: Option<String>,
    pub created_at: Option<String>,
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// Whether a credential is available. Without one no request is attempted.
    fn is_configured(&self) -> bool;

    async fn fetch_hot(&self) -> Result<Vec<NewsPost>, UpstreamError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Result of asking one model for a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Text(String),
    /// The next candidate model may still succeed (unknown model, network failure).
    Retryable(String),
    /// No candidate can succeed (bad credentials, no credit).
    Terminal(String),
}

impl From<UpstreamError> for CompletionOutcome {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized | UpstreamError::PaymentRequired => {
                CompletionOutcome::Terminal(err.to_string())
            }
            other => CompletionOutcome::Retryable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, model: &str, request: &CompletionRequest) -> CompletionOutcome;
}
