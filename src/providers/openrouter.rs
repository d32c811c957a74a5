use super::util::{COMPLETION_TIMEOUT, build_client, send};
use crate::core::upstream::{
    CompletionBackend, CompletionOutcome, CompletionRequest, UpstreamError,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// OpenAI-compatible chat completion backend served by OpenRouter.
pub struct OpenRouterBackend {
    base_url: String,
    api_key: String,
    app_url: String,
    client: reqwest::Client,
}

impl OpenRouterBackend {
    pub fn new(base_url: &str, api_key: &str, app_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            app_url: app_url.unwrap_or("http://localhost:3000").to_string(),
            client: build_client(COMPLETION_TIMEOUT)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    #[instrument(name = "OpenRouterCompletion", skip(self, request))]
    async fn complete(&self, model: &str, request: &CompletionRequest) -> CompletionOutcome {
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {}", url);
        let call = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", "Coindash")
            .json(&body);

        let response = match send(call).await {
            Ok(response) => response,
            Err(e) => return e.into(),
        };
        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return UpstreamError::from(e).into(),
        };

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        CompletionOutcome::Text(text)
    }
}
