//! User preferences consumed by the dashboard

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestorType {
    #[serde(rename = "HODLer")]
    Hodler,
    #[serde(rename = "Day Trader")]
    DayTrader,
    #[serde(rename = "NFT Collector")]
    NftCollector,
    #[serde(rename = "DeFi Enthusiast")]
    DefiEnthusiast,
    #[serde(rename = "Crypto Newbie")]
    CryptoNewbie,
}

impl Display for InvestorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                InvestorType::Hodler => "HODLer",
                InvestorType::DayTrader => "Day Trader",
                InvestorType::NftCollector => "NFT Collector",
                InvestorType::DefiEnthusiast => "DeFi Enthusiast",
                InvestorType::CryptoNewbie => "Crypto Newbie",
            }
        )
    }
}

impl FromStr for InvestorType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "hodler" => Ok(InvestorType::Hodler),
            "day trader" => Ok(InvestorType::DayTrader),
            "nft collector" => Ok(InvestorType::NftCollector),
            "defi enthusiast" => Ok(InvestorType::DefiEnthusiast),
            "crypto newbie" => Ok(InvestorType::CryptoNewbie),
            _ => Err(anyhow::anyhow!("Invalid investor type: {}", s)),
        }
    }
}

/// Dashboard cards a consumer may choose to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    News,
    Prices,
    Insight,
    Meme,
}

impl Section {
    /// Content-type tag that enables this section.
    pub fn content_type(&self) -> &'static str {
        match self {
            Section::News => "Market News",
            Section::Prices => "Charts",
            Section::Insight => "Social",
            Section::Meme => "Fun",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(
        default,
        alias = "investor_type",
        deserialize_with = "deserialize_investor_type"
    )]
    pub investor_type: Option<InvestorType>,
    #[serde(default, alias = "content_types")]
    pub content_types: Vec<String>,
}

/// A blank investor type means none was picked.
fn deserialize_investor_type<'de, D>(deserializer: D) -> Result<Option<InvestorType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl UserPreferences {
    /// An empty content-type selection shows every section.
    pub fn shows(&self, section: Section) -> bool {
        self.content_types.is_empty()
            || self
                .content_types
                .iter()
                .any(|c| c.eq_ignore_ascii_case(section.content_type()))
    }
}

/// Preferences as echoed in the dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesEcho {
    pub assets: Vec<String>,
    pub investor_type: String,
    pub content_types: Vec<String>,
}

impl From<&UserPreferences> for PreferencesEcho {
    fn from(prefs: &UserPreferences) -> Self {
        Self {
            assets: prefs.assets.clone(),
            investor_type: prefs
                .investor_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            content_types: prefs.content_types.clone(),
        }
    }
}
