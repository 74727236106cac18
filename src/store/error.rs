use std::path::PathBuf;

/// Failures of the session store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session storage unavailable at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session record {path} holds id {found}, expected {expected}")]
    IdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
