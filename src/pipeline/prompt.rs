use crate::session::Message;

/// Instruction placed ahead of every conversation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are responding to a text message that was transcribed \
from audio. It likely will miss punctuation, especially periods. Do your best to make sense of it. \
The text that you return will be synthesized back to speech, so please do not return extremely \
long responses.";

/// Assemble the ordered prompt: system instruction, prior history, new user turn
pub fn build_prompt(system_prompt: &str, history: &[Message], user: &Message) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend_from_slice(history);
    messages.push(user.clone());
    messages
}
