//! Chat completion capability
//!
//! The pipeline only depends on `ChatCompletion`: given a model and an
//! ordered list of role-tagged messages, return candidate replies.

mod openai;

pub use openai::{OpenAiChatClient, API_KEY_ENV, DEFAULT_BASE_URL};

use crate::session::Message;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One candidate reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// The candidate the pipeline uses
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }
}

#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
