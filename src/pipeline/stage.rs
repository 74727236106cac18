use std::fmt;

/// Progress of a single pipeline run
///
/// Runs move forward through the stages in declaration order; any
/// non-terminal stage may instead end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ReceivingAudio,
    Transcribing,
    LoadingSession,
    Composing,
    AwaitingCompletion,
    Persisting,
    Synthesizing,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ReceivingAudio => "receiving_audio",
            Stage::Transcribing => "transcribing",
            Stage::LoadingSession => "loading_session",
            Stage::Composing => "composing",
            Stage::AwaitingCompletion => "awaiting_completion",
            Stage::Persisting => "persisting",
            Stage::Synthesizing => "synthesizing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
