//! Durable session persistence
//!
//! One JSON record per session id, replaced atomically on every save.
//! Access is serialized per session id so unrelated conversations never
//! wait on each other:
//! - `FileSessionStore::get` / `save` for single reads and writes
//! - `FileSessionStore::checkout` for a read-modify-write that spans a
//!   whole pipeline run (see `SessionLease`)

mod error;
mod file;
mod locks;

pub use error::StoreError;
pub use file::{FileSessionStore, SessionLease};
