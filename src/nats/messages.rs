use serde::{Deserialize, Serialize};

/// Transcription request published to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub request_id: String,
    pub audio: String,  // Base64-encoded audio upload
    pub content_type: String,
    pub language: String,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Transcript returned by the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptReply {
    pub request_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Synthesis request published to the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesizeRequest {
    pub request_id: String,
    pub text: String,
    pub voice: String,
    pub language: String,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Audio returned by the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisReply {
    pub request_id: String,
    #[serde(default)]
    pub audio: String,  // Base64-encoded audio
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
