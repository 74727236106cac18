//! HTTP API for voice clients
//!
//! - POST /upload?session=<id> - Upload an utterance, receive spoken reply
//! - GET /session/:session_id - Fetch a conversation history
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::SESSION_ID_HEADER;
pub use routes::create_router;
pub use state::AppState;
