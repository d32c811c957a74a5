use crate::core::preferences::UserPreferences;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_MODELS: &[&str] = &["openai/gpt-4o"];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
}

impl Default for CoinGeckoProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoPanicProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for CryptoPanicProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cryptopanic.com/api/developer/v2".to_string(),
            api_key: None,
        }
    }
}

impl CryptoPanicProviderConfig {
    /// Configured key, or `CRYPTOPANIC_API_KEY` when the config leaves it empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), "CRYPTOPANIC_API_KEY")
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenRouterProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    pub app_url: Option<String>,
}

impl Default for OpenRouterProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            models: default_models(),
            app_url: None,
        }
    }
}

impl OpenRouterProviderConfig {
    /// Configured key, or `OPENROUTER_API_KEY` when the config leaves it empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_key(self.api_key.as_deref(), "OPENROUTER_API_KEY")
    }
}

fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env::var(env_var)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub coingecko: CoinGeckoProviderConfig,
    #[serde(default)]
    pub cryptopanic: CryptoPanicProviderConfig,
    #[serde(default)]
    pub openrouter: OpenRouterProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub preferences: UserPreferences,
    pub user: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "coindash", "coindash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "coindash", "coindash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or("local")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
