// Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_relay::{
    ChatCompletion, ChatCompletionRequest, ChatCompletionResponse, Choice, ConversationPipeline,
    FileSessionStore, Message, PipelineOptions, Synthesizer, Transcriber,
};

pub const REPLY_AUDIO: &[u8] = b"ID3-fake-mp3-bytes";

pub struct ScriptedTranscriber {
    transcript: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn says(text: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            transcript: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        assert!(!audio.is_empty(), "pipeline must not transcribe empty audio");
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.transcript {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("speech service unavailable"),
        }
    }
}

pub enum ChatBehavior {
    Reply(String),
    NoChoices,
    Fail,
    Hang,
}

pub struct ScriptedChat {
    behavior: ChatBehavior,
    delay: Duration,
    pub requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedChat {
    pub fn new(behavior: ChatBehavior) -> Arc<Self> {
        Self::with_delay(behavior, Duration::ZERO)
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(ChatBehavior::Reply(text.to_string()))
    }

    pub fn with_delay(behavior: ChatBehavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ChatCompletionRequest {
        self.requests.lock().unwrap().last().cloned().expect("no chat request made")
    }
}

#[async_trait::async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            ChatBehavior::Reply(text) => Ok(ChatCompletionResponse {
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(text.clone()),
                    finish_reason: Some("stop".to_string()),
                }],
                usage: None,
            }),
            ChatBehavior::NoChoices => Ok(ChatCompletionResponse {
                choices: Vec::new(),
                usage: None,
            }),
            ChatBehavior::Fail => anyhow::bail!("received 503 response from chat completion API"),
            ChatBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("hung chat call should have been cancelled")
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedSynthesizer {
    fail: bool,
    audio: Vec<u8>,
    pub texts: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            audio: REPLY_AUDIO.to_vec(),
            texts: Mutex::new(Vec::new()),
        })
    }

    /// Succeeds without producing any audio
    pub fn silent() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            audio: Vec::new(),
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            audio: Vec::new(),
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("TTS service failed: voice not found");
        }
        Ok(self.audio.clone())
    }
}

pub fn test_options() -> PipelineOptions {
    PipelineOptions {
        model: "gpt-4".to_string(),
        collaborator_timeout: Duration::from_secs(5),
        ..PipelineOptions::default()
    }
}

pub fn pipeline(
    store: Arc<FileSessionStore>,
    transcriber: Arc<ScriptedTranscriber>,
    chat: Arc<ScriptedChat>,
    synthesizer: Arc<ScriptedSynthesizer>,
    options: PipelineOptions,
) -> ConversationPipeline {
    ConversationPipeline::new(transcriber, synthesizer, chat, store, options)
}
