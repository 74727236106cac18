//! Conversation pipeline
//!
//! One run turns an uploaded utterance into a spoken reply:
//! transcribe → load session → compose prompt → chat completion →
//! persist session → synthesize.

mod error;
mod pipeline;
mod prompt;
mod stage;

pub use error::{ErrorKind, InputError, PipelineError};
pub use pipeline::{ConversationPipeline, PipelineOptions, PipelineRequest, PipelineResponse};
pub use prompt::{build_prompt, DEFAULT_SYSTEM_PROMPT};
pub use stage::Stage;
