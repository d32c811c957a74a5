use chrono::{Duration, Utc};
use coindash::core::config::AppConfig;
use coindash::core::record::{CachedNewsItem, NewsSource, TargetType, Vote};
use coindash::feedback::FeedbackStatus;
use coindash::store::RecordStore;
use coindash::{App, AppCommand};
use std::fs;
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub async fn create_price_server(ids: &str, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", ids))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_news_server(status: u16, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/"))
            .and(query_param("filter", "hot"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_completion_server(status: u16, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn config(prices: &MockServer, news: &MockServer, completions: &MockServer, models: &[&str]) -> AppConfig {
        let models = models
            .iter()
            .map(|m| format!("\"{m}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let yaml = format!(
            r#"
preferences:
  assets: ["bitcoin"]
  investorType: "HODLer"
  contentTypes: []
user: "alice"
providers:
  coingecko:
    base_url: "{}"
  cryptopanic:
    base_url: "{}"
    api_key: "news-key"
  openrouter:
    base_url: "{}"
    api_key: "completion-key"
    models: [{models}]
"#,
            prices.uri(),
            news.uri(),
            completions.uri()
        );
        serde_yaml::from_str(&yaml).expect("test config should parse")
    }
}

const BITCOIN_QUOTE: &str =
    r#"{"bitcoin": {"usd": 50000, "usd_24h_change": 1.2, "usd_market_cap": 980000000000}}"#;

const HOT_POSTS: &str = r#"{
    "results": [
        {
            "id": 1,
            "title": "Bitcoin ETF inflows surge",
            "original_url": "https://news.example.com/etf",
            "description": "Record inflows this week",
            "instruments": [{"code": "BTC", "title": "Bitcoin"}],
            "source": {"title": "Example News", "domain": "example.com"},
            "published_at": "2025-03-01T10:00:00Z"
        },
        {"id": 2, "slug": "eth-upgrade", "title": "Ethereum upgrade ships"},
        {"id": 3, "description": "No title, dropped"}
    ]
}"#;

#[test_log::test(tokio::test)]
async fn test_full_dashboard_flow_with_mocks() {
    let prices = test_utils::create_price_server("bitcoin", BITCOIN_QUOTE, 1).await;
    let news = test_utils::create_news_server(200, HOT_POSTS, 1).await;
    let completions = test_utils::create_completion_server(
        200,
        r#"{"choices": [{"message": {"content": "Hold steady and keep learning."}}]}"#,
        2,
    )
    .await;
    let config = test_utils::config(&prices, &news, &completions, &["test/model"]);
    let app = App::new(&config, RecordStore::in_memory()).unwrap();

    let payload = app.dashboard.fetch(&config.preferences).await.unwrap();
    info!(?payload, "First dashboard");

    assert_eq!(payload.prices.len(), 1);
    let bitcoin = &payload.prices[0];
    assert_eq!(bitcoin.id, "price-bitcoin");
    assert_eq!(bitcoin.name, "Bitcoin");
    assert_eq!(bitcoin.price, 50000.0);
    assert_eq!(bitcoin.change24h, 1.2);
    assert_eq!(bitcoin.market_cap, 9.8e11);

    assert_eq!(payload.news.len(), 2);
    assert_eq!(payload.news[0].title, "Bitcoin ETF inflows surge");
    assert_eq!(payload.news[0].tags, vec!["BTC"]);
    assert_eq!(payload.news[1].url, "https://cryptopanic.com/news/eth-upgrade/");
    assert_eq!(payload.insight.text, "Hold steady and keep learning.");
    assert_eq!(payload.preferences.investor_type, "HODLer");

    // Within the TTL both feeds are served from the store
    let again = app.dashboard.fetch(&config.preferences).await.unwrap();
    assert_eq!(again.prices, payload.prices);
    assert_eq!(again.news.len(), 2);
    assert_ne!(again.insight.id, payload.insight.id);
}

#[test_log::test(tokio::test)]
async fn test_rate_limited_news_serves_older_cache() {
    let prices = test_utils::create_price_server("bitcoin", BITCOIN_QUOTE, 0).await;
    let news = test_utils::create_news_server(429, r#"{"info": "rate limited"}"#, 1).await;
    let completions = test_utils::create_completion_server(500, "", 0).await;
    let config = test_utils::config(&prices, &news, &completions, &[]);

    let store = RecordStore::in_memory();
    let two_hours_ago = Utc::now() - Duration::hours(2);
    store
        .news
        .put(CachedNewsItem {
            id: "cached-1".to_string(),
            source: NewsSource::PrimaryApi,
            title: "Older headline".to_string(),
            url: "https://news.example.com/older".to_string(),
            summary: String::new(),
            tags: vec![],
            created_at: two_hours_ago,
            fetched_at: two_hours_ago,
        })
        .await
        .unwrap();
    let app = App::new(&config, store).unwrap();

    let items = app.dashboard.news().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Older headline");
    assert_eq!(items[0].summary, "Older headline");
}

#[test_log::test(tokio::test)]
async fn test_rejected_completion_uses_template() {
    let prices = test_utils::create_price_server("bitcoin", BITCOIN_QUOTE, 0).await;
    let news = test_utils::create_news_server(200, HOT_POSTS, 0).await;
    // 401 stops the chain, so only the first model is consulted
    let completions =
        test_utils::create_completion_server(401, r#"{"error": "bad key"}"#, 1).await;
    let mut config = test_utils::config(&prices, &news, &completions, &["first/model", "second/model"]);
    config.preferences.assets = vec!["bitcoin".to_string(), "ethereum".to_string()];
    let app = App::new(&config, RecordStore::in_memory()).unwrap();

    let first = app.dashboard.insight(&config.preferences).await;
    assert!(first.text.contains("HODLer"));
    assert!(first.text.contains("bitcoin, ethereum"));
    assert!(!first.id.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_vote_and_purge_against_disk_store() {
    let prices = test_utils::create_price_server("bitcoin", BITCOIN_QUOTE, 0).await;
    let news = test_utils::create_news_server(200, HOT_POSTS, 0).await;
    let completions = test_utils::create_completion_server(500, "", 0).await;
    let config = test_utils::config(&prices, &news, &completions, &[]);

    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let app = App::new(&config, store).unwrap();

    let status = app
        .feedback
        .submit(config.user_id(), TargetType::Price, "price-bitcoin", Vote::Up)
        .await
        .unwrap();
    assert_eq!(status, FeedbackStatus::Created);
    app.run(
        AppCommand::Vote {
            target_type: TargetType::Price,
            target_id: "price-bitcoin".to_string(),
            vote: Vote::Down,
        },
        &config,
    )
    .await
    .unwrap();
    assert_eq!(
        app.feedback
            .current_vote("alice", TargetType::Price, "price-bitcoin")
            .await
            .unwrap(),
        Some(Vote::Down)
    );

    app.run(AppCommand::Purge, &config).await.unwrap();
    assert!(
        app.feedback
            .current_vote("alice", TargetType::Price, "price-bitcoin")
            .await
            .unwrap()
            .is_some()
    );
}

#[test_log::test(tokio::test)]
async fn test_run_command_with_config_file() {
    let prices = test_utils::create_price_server("bitcoin", BITCOIN_QUOTE, 1).await;
    let news = test_utils::create_news_server(200, HOT_POSTS, 0).await;
    let completions = test_utils::create_completion_server(500, "", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    let config_content = format!(
        r#"
preferences:
  assets: ["bitcoin"]
data_path: "{}"
providers:
  coingecko:
    base_url: "{}"
  cryptopanic:
    base_url: "{}"
    api_key: "news-key"
  openrouter:
    base_url: "{}"
    api_key: "completion-key"
"#,
        dir.path().join("data").display(),
        prices.uri(),
        news.uri(),
        completions.uri()
    );
    fs::write(&config_path, config_content).unwrap();

    // Explicit keys keep the environment out of it; the news and completion mocks expect no calls

    let result = coindash::run_command(AppCommand::Prices(vec![]), config_path.to_str()).await;
    assert!(result.is_ok(), "prices command failed: {result:?}");
    assert!(dir.path().join("data").join("cache").exists());
}
