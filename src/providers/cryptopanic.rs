use super::util::{FEED_TIMEOUT, build_client, send};
use crate::core::upstream::{NewsFeed, NewsPost, UpstreamError};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// News feed backed by CryptoPanic's developer posts API.
pub struct CryptoPanicProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CryptoPanicProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: build_client(FEED_TIMEOUT)?,
        })
    }
}

// v2 answers with `results`, older deployments with `data`
#[derive(Debug, Deserialize)]
struct PostsResponse {
    results: Option<Vec<serde_json::Value>>,
    data: Option<Vec<serde_json::Value>>,
}

#[async_trait]
impl NewsFeed for CryptoPanicProvider {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(name = "CryptoPanicNewsFetch", skip(self))]
    async fn fetch_hot(&self) -> Result<Vec<NewsPost>, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::Unauthorized)?;
        let url = reqwest::Url::parse_with_params(
            &format!("{}/posts/", self.base_url),
            &[("auth_token", api_key), ("public", "true"), ("filter", "hot")],
        )
        .map_err(|e| UpstreamError::Transport(format!("Invalid news API URL: {e}")))?;
        debug!("Requesting hot posts from {}", self.base_url);

        let response = send(self.client.get(url)).await?;
        let body: PostsResponse = response.json().await?;
        let raw = body.results.or(body.data).unwrap_or_default();

        let posts = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<NewsPost>(value) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(index, error = %e, "Discarding undecodable news post");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(received = posts.len(), "Received CryptoPanic posts");
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/"))
            .and(query_param("auth_token", "secret"))
            .and(query_param("public", "true"))
            .and(query_param("filter", "hot"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_hot_posts() {
        let body = r#"{
            "results": [
                {
                    "id": 42,
                    "title": "Bitcoin rallies",
                    "original_url": "https://news.example.com/btc",
                    "description": "BTC is up",
                    "instruments": [{"code": "BTC", "title": "Bitcoin"}],
                    "source": {"title": "Example News", "domain": "example.com"},
                    "published_at": "2025-01-02T03:04:05Z"
                },
                {"id": "abc", "slug": "eth-news", "title": "Ether moves"},
                {"title": 7}
            ]
        }"#;
        let mock_server = create_mock_server(200, body).await;
        let provider =
            CryptoPanicProvider::new(&mock_server.uri(), Some("secret".to_string())).unwrap();

        let posts = provider.fetch_hot().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title.as_deref(), Some("Bitcoin rallies"));
        assert_eq!(posts[0].instruments[0].code.as_deref(), Some("BTC"));
        assert_eq!(posts[1].slug.as_deref(), Some("eth-news"));
    }

    #[tokio::test]
    async fn test_legacy_data_envelope() {
        let body = r#"{"data": [{"id": 1, "title": "Legacy"}]}"#;
        let mock_server = create_mock_server(200, body).await;
        let provider =
            CryptoPanicProvider::new(&mock_server.uri(), Some("secret".to_string())).unwrap();

        let posts = provider.fetch_hot().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title.as_deref(), Some("Legacy"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = create_mock_server(429, r#"{"info": "quota"}"#).await;
        let provider =
            CryptoPanicProvider::new(&mock_server.uri(), Some("secret".to_string())).unwrap();

        assert!(matches!(
            provider.fetch_hot().await,
            Err(UpstreamError::RateLimited)
        ));
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let provider = CryptoPanicProvider::new("http://localhost", Some("  ".to_string())).unwrap();
        assert!(!provider.is_configured());
        let provider = CryptoPanicProvider::new("http://localhost", None).unwrap();
        assert!(!provider.is_configured());
    }
}
