use crate::pipeline::ConversationPipeline;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConversationPipeline>,
}

impl AppState {
    pub fn new(pipeline: ConversationPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
