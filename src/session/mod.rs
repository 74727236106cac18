//! Conversation model
//!
//! This module provides the persisted conversation unit:
//! - `Message`: one role-tagged turn
//! - `SessionId`: validated, file-name-safe session identifier
//! - `Session`: ordered, append-only message history keyed by id

mod id;
mod message;
mod session;

pub use id::{InvalidSessionId, SessionId};
pub use message::{Message, Role};
pub use session::Session;
