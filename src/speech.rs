//! Speech capabilities consumed by the conversation pipeline
//!
//! Implementations:
//! - `NatsSpeechClient`: STT/TTS services reached over NATS request/reply

use anyhow::Result;

/// Speech-to-text
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete audio upload to plain text
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Text-to-speech
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize reply text to encoded audio bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
