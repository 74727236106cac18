use super::stage::Stage;
use crate::session::InvalidSessionId;
use crate::store::StoreError;

/// Problems with what the caller sent
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("audio upload is empty")]
    EmptyAudio,

    #[error("failed to read audio upload: {0}")]
    Unreadable(String),

    #[error(transparent)]
    InvalidSessionId(#[from] InvalidSessionId),
}

/// Why a pipeline run failed
///
/// Every variant is terminal for the run; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// A transcription, completion or synthesis call failed or returned
    /// something unusable
    #[error("{stage} failed: {source:#}")]
    Collaborator {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error("session store failed: {0}")]
    Store(#[from] StoreError),
}

/// Coarse error taxonomy, for callers mapping failures to responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Collaborator,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Collaborator => "collaborator",
            ErrorKind::Store => "store",
        }
    }
}

impl PipelineError {
    pub(crate) fn collaborator(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator {
            stage,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Input(_) => ErrorKind::Input,
            PipelineError::Collaborator { .. } => ErrorKind::Collaborator,
            PipelineError::Store(_) => ErrorKind::Store,
        }
    }

    /// Stage the run failed in, when a collaborator was at fault
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Collaborator { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<InvalidSessionId> for PipelineError {
    fn from(e: InvalidSessionId) -> Self {
        PipelineError::Input(e.into())
    }
}
