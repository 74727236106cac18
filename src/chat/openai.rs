use super::{ChatCompletion, ChatCompletionRequest, ChatCompletionResponse};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_KEY";

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url: String = base_url.into();

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve the API key from config, falling back to `OPENAI_KEY`
    pub fn resolve_api_key(configured: Option<&str>) -> Result<String> {
        configured
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .with_context(|| format!("OpenAI key not found in config or env var {}", API_KEY_ENV))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait::async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        debug!(
            "Requesting chat completion (model={}, messages={})",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to reach chat completion API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read chat completion response")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            anyhow::bail!("received {} response from chat completion API: {}", status, detail);
        }

        serde_json::from_str(&body).context("Failed to parse chat completion response")
    }

    fn name(&self) -> &str {
        "openai"
    }
}
