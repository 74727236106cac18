use super::error::{InputError, PipelineError};
use super::prompt::{build_prompt, DEFAULT_SYSTEM_PROMPT};
use super::stage::Stage;
use crate::chat::{ChatCompletion, ChatCompletionRequest};
use crate::session::{Message, Session, SessionId};
use crate::speech::{Synthesizer, Transcriber};
use crate::store::FileSessionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settings for the conversation pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Chat model identifier passed to the completion capability
    pub model: String,

    /// Instruction placed ahead of every conversation
    pub system_prompt: String,

    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,

    /// Upper bound on each transcription, completion and synthesis call
    pub collaborator_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            collaborator_timeout: Duration::from_secs(30),
        }
    }
}

/// One uploaded utterance
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Conversation to continue; `None` starts a new one
    pub session_id: Option<SessionId>,

    /// Complete audio upload
    pub audio: Vec<u8>,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    /// The continued session, or the newly created one
    pub session_id: SessionId,
    pub transcript: String,
    pub reply_text: String,
    /// Synthesized reply audio
    pub audio: Vec<u8>,
}

/// Orchestrates speech, chat and session persistence for one utterance at a time
///
/// Runs are independent and may execute concurrently. Runs on the same
/// session are serialized from loading to persisting, so none of their
/// turns are lost. Dropping a `handle` future cancels the in-flight call
/// and discards the pending session update.
pub struct ConversationPipeline {
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    chat: Arc<dyn ChatCompletion>,
    store: Arc<FileSessionStore>,
    options: PipelineOptions,
}

impl ConversationPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        chat: Arc<dyn ChatCompletion>,
        store: Arc<FileSessionStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transcriber,
            synthesizer,
            chat,
            store,
            options,
        }
    }

    pub fn store(&self) -> &Arc<FileSessionStore> {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Produce a spoken reply to one utterance
    pub async fn handle(&self, request: PipelineRequest) -> Result<PipelineResponse, PipelineError> {
        let mut run = Run::new();
        let result = self.run(&mut run, request).await;

        match &result {
            Ok(response) => {
                run.advance(Stage::Done);
                info!(session_id = %response.session_id, "Pipeline run complete");
            }
            Err(e) => {
                let failed_in = run.stage;
                run.advance(Stage::Failed);
                warn!(stage = %failed_in, kind = e.kind().as_str(), "Pipeline run failed: {}", e);
            }
        }

        result
    }

    async fn run(&self, run: &mut Run, request: PipelineRequest) -> Result<PipelineResponse, PipelineError> {
        let PipelineRequest { session_id, audio } = request;

        if audio.is_empty() {
            return Err(InputError::EmptyAudio.into());
        }

        info!("Received {} bytes of voice data", audio.len());

        run.advance(Stage::Transcribing);
        let transcript = self
            .call(Stage::Transcribing, self.transcriber.transcribe(&audio))
            .await?;
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(PipelineError::collaborator(
                Stage::Transcribing,
                anyhow::anyhow!("transcription returned an empty transcript"),
            ));
        }

        info!("Transcript: {}", transcript);

        run.advance(Stage::LoadingSession);
        let mut lease = self.store.checkout(session_id.as_ref()).await?;

        run.advance(Stage::Composing);
        let mut session = match lease.take_session() {
            Some(session) => session,
            None => {
                let session = Session::new();
                if let Some(requested) = &session_id {
                    debug!(requested = %requested, "Unknown session id, starting a new conversation");
                }
                session
            }
        };
        let user = Message::user(transcript.clone());
        let request = ChatCompletionRequest {
            model: self.options.model.clone(),
            messages: build_prompt(&self.options.system_prompt, &session.messages, &user),
            temperature: self.options.temperature,
        };

        run.advance(Stage::AwaitingCompletion);
        let response = self
            .call(Stage::AwaitingCompletion, self.chat.complete(&request))
            .await?;
        // Stored exactly as the model returned it
        let reply_text = response
            .first_choice()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                PipelineError::collaborator(
                    Stage::AwaitingCompletion,
                    anyhow::anyhow!("received empty {} response (no choices)", self.chat.name()),
                )
            })?;
        if reply_text.trim().is_empty() {
            return Err(PipelineError::collaborator(
                Stage::AwaitingCompletion,
                anyhow::anyhow!("{} returned an empty reply", self.chat.name()),
            ));
        }

        run.advance(Stage::Persisting);
        session.push_turn(user, Message::assistant(reply_text.clone()));
        lease.commit(&session).await?;

        run.advance(Stage::Synthesizing);
        let audio = self
            .call(Stage::Synthesizing, self.synthesizer.synthesize(&reply_text))
            .await?;
        if audio.is_empty() {
            return Err(PipelineError::collaborator(
                Stage::Synthesizing,
                anyhow::anyhow!("synthesis returned no audio"),
            ));
        }

        Ok(PipelineResponse {
            session_id: session.id,
            transcript,
            reply_text,
            audio,
        })
    }

    /// Await a collaborator call under the configured timeout
    async fn call<T>(
        &self,
        stage: Stage,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, PipelineError> {
        let limit = self.options.collaborator_timeout;

        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(PipelineError::collaborator(stage, source)),
            Err(_) => Err(PipelineError::collaborator(
                stage,
                anyhow::anyhow!("timed out after {:?}", limit),
            )),
        }
    }
}

/// Stage bookkeeping for one run
struct Run {
    stage: Stage,
}

impl Run {
    fn new() -> Self {
        Self {
            stage: Stage::ReceivingAudio,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(!self.stage.is_terminal(), "run already finished");
        debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }
}
