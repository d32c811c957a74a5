pub mod cli;
pub mod core;
pub mod dashboard;
pub mod feedback;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::record::{TargetType, Vote};
use crate::core::upstream::CompletionBackend;
use crate::dashboard::Dashboard;
use crate::feedback::FeedbackService;
use crate::providers::{CoinGeckoProvider, CryptoPanicProvider, OpenRouterBackend};
use crate::store::RecordStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const JANITOR_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub enum AppCommand {
    Dashboard { json: bool },
    Prices(Vec<String>),
    News,
    Insight,
    Vote {
        target_type: TargetType,
        target_id: String,
        vote: Vote,
    },
    Purge,
}

/// Services wired from one configuration and one store.
pub struct App {
    pub dashboard: Dashboard,
    pub feedback: FeedbackService,
    pub store: RecordStore,
}

impl App {
    pub fn new(config: &AppConfig, store: RecordStore) -> Result<Self> {
        let providers = &config.providers;
        let price_feed = Arc::new(CoinGeckoProvider::new(&providers.coingecko.base_url)?);
        let news_feed = Arc::new(CryptoPanicProvider::new(
            &providers.cryptopanic.base_url,
            providers.cryptopanic.resolved_api_key(),
        )?);

        let backend: Option<Arc<dyn CompletionBackend>> =
            match providers.openrouter.resolved_api_key() {
                Some(key) => Some(Arc::new(OpenRouterBackend::new(
                    &providers.openrouter.base_url,
                    &key,
                    providers.openrouter.app_url.as_deref(),
                )?)),
                None => {
                    info!("No OpenRouter API key, insights will use the template");
                    None
                }
            };

        Ok(Self {
            dashboard: Dashboard::new(
                &store,
                price_feed,
                news_feed,
                backend,
                providers.openrouter.models.clone(),
            ),
            feedback: FeedbackService::new(Arc::clone(&store.feedback)),
            store,
        })
    }

    pub async fn run(&self, command: AppCommand, config: &AppConfig) -> Result<()> {
        let prefs = &config.preferences;
        match command {
            AppCommand::Dashboard { json } => cli::dashboard::run(&self.dashboard, prefs, json).await,
            AppCommand::Prices(ids) => {
                let ids = if ids.is_empty() { prefs.assets.clone() } else { ids };
                cli::dashboard::run_prices(&self.dashboard, &ids).await
            }
            AppCommand::News => cli::dashboard::run_news(&self.dashboard).await,
            AppCommand::Insight => cli::dashboard::run_insight(&self.dashboard, prefs).await,
            AppCommand::Vote {
                target_type,
                target_id,
                vote,
            } => {
                cli::feedback::run(&self.feedback, config.user_id(), target_type, &target_id, vote)
                    .await
            }
            AppCommand::Purge => {
                let removed = self.store.purge_expired().await?;
                println!("Removed {removed} expired records");
                Ok(())
            }
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(user = config.user_id(), assets = ?config.preferences.assets, "Loaded config");

    let data_path = config.default_data_path()?;
    let store = RecordStore::open(&data_path.join("cache"))?;
    if !matches!(command, AppCommand::Purge) {
        let removed = store.purge_expired().await?;
        debug!(removed, "Purged expired records at startup");
    }

    let janitor = store.spawn_janitor(JANITOR_INTERVAL);
    let app = App::new(&config, store)?;
    let result = app.run(command, &config).await;
    janitor.abort();
    result
}
