//! Personalized insight text, generated by the first willing model or a fixed template.

use crate::core::preferences::UserPreferences;
use crate::core::upstream::{CompletionBackend, CompletionOutcome, CompletionRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a knowledgeable crypto investment advisor. Provide brief, \
actionable insights tailored to individual investor profiles. Keep responses under 100 words \
and focus on practical advice.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    fn new(text: String) -> Self {
        Self {
            id: format!("insight-{}", uuid::Uuid::new_v4().simple()),
            text,
            generated_at: Utc::now(),
        }
    }
}

/// Deterministic insight used when no model produced text.
pub fn template_text(prefs: &UserPreferences) -> String {
    let investor = prefs
        .investor_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "crypto investor".to_string());
    let assets = if prefs.assets.is_empty() {
        "the market".to_string()
    } else {
        prefs.assets.join(", ")
    };
    format!(
        "As a {investor}, staying informed about {assets} is key. Consider diversifying your \
         portfolio and keeping an eye on market trends."
    )
}

fn completion_request(prefs: &UserPreferences) -> CompletionRequest {
    let investor = prefs
        .investor_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "crypto investor".to_string());
    let assets = if prefs.assets.is_empty() {
        "cryptocurrencies".to_string()
    } else {
        prefs.assets.join(", ")
    };
    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: format!(
            "Generate a brief, personalized crypto investment insight (under 100 words) for a \
             {investor} interested in {assets}. Make it actionable and relevant to current \
             market trends."
        ),
        max_tokens: 150,
        temperature: 0.7,
    }
}

pub struct InsightGenerator {
    backend: Option<Arc<dyn CompletionBackend>>,
    models: Vec<String>,
}

impl InsightGenerator {
    /// `models` are tried in order. Without a backend every insight comes from the template.
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    #[instrument(name = "InsightGenerator", skip_all)]
    pub async fn generate(&self, prefs: &UserPreferences) -> Insight {
        let Some(backend) = &self.backend else {
            debug!("No completion backend configured, using template insight");
            return Insight::new(template_text(prefs));
        };

        let request = completion_request(prefs);
        for model in &self.models {
            debug!(model = %model, "Trying completion model");
            match backend.complete(model, &request).await {
                CompletionOutcome::Text(text) if !text.trim().is_empty() => {
                    info!(model = %model, "Generated insight");
                    return Insight::new(text.trim().to_string());
                }
                CompletionOutcome::Text(_) => {
                    warn!(model = %model, "Model returned empty text, trying next");
                }
                CompletionOutcome::Retryable(reason) => {
                    warn!(model = %model, reason = %reason, "Model failed, trying next");
                }
                CompletionOutcome::Terminal(reason) => {
                    error!(model = %model, reason = %reason, "Completion rejected, giving up");
                    break;
                }
            }
        }

        debug!("Falling back to template insight");
        Insight::new(template_text(prefs))
    }
}
