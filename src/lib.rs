pub mod chat;
pub mod config;
pub mod http;
pub mod nats;
pub mod pipeline;
pub mod session;
pub mod speech;
pub mod store;

pub use chat::{ChatCompletion, ChatCompletionRequest, ChatCompletionResponse, Choice, OpenAiChatClient};
pub use config::Config;
pub use http::{create_router, AppState};
pub use nats::{NatsSpeechClient, SpeechOptions};
pub use pipeline::{
    ConversationPipeline, ErrorKind, PipelineError, PipelineOptions, PipelineRequest,
    PipelineResponse, Stage,
};
pub use session::{Message, Role, Session, SessionId};
pub use speech::{Synthesizer, Transcriber};
pub use store::{FileSessionStore, SessionLease, StoreError};
