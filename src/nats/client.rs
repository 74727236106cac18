use super::messages::{SynthesisReply, SynthesizeRequest, TranscribeRequest, TranscriptReply};
use crate::speech::{Synthesizer, Transcriber};
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Subjects and voice settings for the speech services
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    pub transcribe_subject: String,
    pub synthesize_subject: String,
    /// MIME type of uploaded audio, passed through to the STT service
    pub input_content_type: String,
    pub language: String,
    pub voice: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            transcribe_subject: "stt.transcribe".to_string(),
            synthesize_subject: "tts.synthesize".to_string(),
            input_content_type: "audio/webm;codecs=opus".to_string(),
            language: "en-US".to_string(),
            voice: "neutral".to_string(),
        }
    }
}

/// Speech-to-text and text-to-speech over NATS request/reply
pub struct NatsSpeechClient {
    client: Client,
    options: SpeechOptions,
}

impl NatsSpeechClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, options: SpeechOptions, request_timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::ConnectOptions::new()
            .request_timeout(Some(request_timeout))
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, options })
    }

    async fn request<Req, Rep>(&self, subject: &str, request: &Req) -> Result<Rep>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;

        let reply = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("No reply on {}", subject))?;

        serde_json::from_slice(&reply.payload)
            .with_context(|| format!("Failed to parse reply from {}", subject))
    }
}

fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait::async_trait]
impl Transcriber for NatsSpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let request = TranscribeRequest {
            request_id: request_id(),
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            content_type: self.options.input_content_type.clone(),
            language: self.options.language.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let reply: TranscriptReply = self
            .request(&self.options.transcribe_subject, &request)
            .await?;

        if let Some(error) = reply.error {
            anyhow::bail!("STT service failed: {}", error);
        }

        debug!(
            "Transcript received (request={}, chars={}, confidence={:?})",
            reply.request_id,
            reply.text.len(),
            reply.confidence
        );

        Ok(reply.text)
    }
}

#[async_trait::async_trait]
impl Synthesizer for NatsSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            request_id: request_id(),
            text: text.to_string(),
            voice: self.options.voice.clone(),
            language: self.options.language.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let reply: SynthesisReply = self
            .request(&self.options.synthesize_subject, &request)
            .await?;

        if let Some(error) = reply.error {
            anyhow::bail!("TTS service failed: {}", error);
        }

        let audio = base64::engine::general_purpose::STANDARD
            .decode(reply.audio.as_bytes())
            .context("TTS reply audio is not valid base64")?;
        if audio.is_empty() {
            anyhow::bail!("TTS reply {} carried no audio", reply.request_id);
        }

        debug!(
            "Synthesized audio received (request={}, bytes={})",
            reply.request_id,
            audio.len()
        );

        Ok(audio)
    }
}
