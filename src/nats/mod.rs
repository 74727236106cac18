pub mod client;
pub mod messages;

pub use client::{NatsSpeechClient, SpeechOptions};
pub use messages::{SynthesisReply, SynthesizeRequest, TranscribeRequest, TranscriptReply};
