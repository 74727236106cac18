use crate::nats::SpeechOptions;
use crate::pipeline::{PipelineOptions, DEFAULT_SYSTEM_PROMPT};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub sessions: SessionsConfig,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    pub directory: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    pub model: String,
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,
    /// Falls back to the OPENAI_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    pub nats_url: String,
    #[serde(default = "default_transcribe_subject")]
    pub transcribe_subject: String,
    #[serde(default = "default_synthesize_subject")]
    pub synthesize_subject: String,
    #[serde(default = "default_input_content_type")]
    pub input_content_type: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_voice")]
    pub voice: String,
}

#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_timeout_secs")]
    pub collaborator_timeout_secs: u64,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_secs: default_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 << 20 // 10 MiB
}

fn default_chat_base_url() -> String {
    crate::chat::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_transcribe_subject() -> String {
    SpeechOptions::default().transcribe_subject
}

fn default_synthesize_subject() -> String {
    SpeechOptions::default().synthesize_subject
}

fn default_input_content_type() -> String {
    SpeechOptions::default().input_content_type
}

fn default_language() -> String {
    SpeechOptions::default().language
}

fn default_voice() -> String {
    SpeechOptions::default().voice
}

impl Config {
    /// Load a config file, then apply `VOICE_RELAY__SECTION__KEY` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICE_RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Session directory with `~` and env vars expanded
    pub fn session_directory(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.sessions.directory)
            .with_context(|| format!("Failed to expand session directory {}", self.sessions.directory))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            model: self.chat.model.clone(),
            system_prompt: self
                .pipeline
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: self.chat.temperature,
            collaborator_timeout: Duration::from_secs(self.pipeline.collaborator_timeout_secs),
        }
    }

    pub fn speech_options(&self) -> SpeechOptions {
        SpeechOptions {
            transcribe_subject: self.speech.transcribe_subject.clone(),
            synthesize_subject: self.speech.synthesize_subject.clone(),
            input_content_type: self.speech.input_content_type.clone(),
            language: self.speech.language.clone(),
            voice: self.speech.voice.clone(),
        }
    }
}
