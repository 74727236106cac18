use super::error::StoreError;
use super::locks::{KeyGuard, KeyedLocks};
use crate::session::{Session, SessionId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Session store backed by one JSON file per session
#[derive(Debug)]
pub struct FileSessionStore {
    directory: PathBuf,
    locks: KeyedLocks,
}

impl FileSessionStore {
    /// Open (creating if needed) a session directory
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();

        fs::create_dir_all(&directory)
            .await
            .map_err(|e| StoreError::io(&directory, e))?;

        info!("Session store ready at {}", directory.display());

        Ok(Self {
            directory,
            locks: KeyedLocks::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Load a session
    ///
    /// `None` and ids with no record both yield `Ok(None)`; only an
    /// unreadable or corrupt record is an error.
    pub async fn get(&self, id: Option<&SessionId>) -> Result<Option<Session>, StoreError> {
        let Some(id) = id else {
            return Ok(None);
        };

        let _guard = self.locks.lock(id.as_str()).await;
        self.read_record(id).await
    }

    /// Durably replace the record for `session.id`
    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = self.locks.lock(session.id.as_str()).await;
        self.write_record(session).await
    }

    /// Load a session and keep it locked until the lease is committed or dropped
    ///
    /// Concurrent checkouts of the same id queue behind each other, so a
    /// read-modify-write done through the lease never loses another run's
    /// update. When there is no record to extend the lease holds no lock:
    /// the caller starts a fresh session whose id nobody else knows yet.
    pub async fn checkout(&self, id: Option<&SessionId>) -> Result<SessionLease<'_>, StoreError> {
        let Some(id) = id else {
            return Ok(SessionLease::vacant(self));
        };

        let guard = self.locks.lock(id.as_str()).await;

        match self.read_record(id).await? {
            Some(session) => Ok(SessionLease {
                store: self,
                session: Some(session),
                held: Some((id.clone(), guard)),
            }),
            None => {
                debug!(session_id = %id, "No record for session, starting fresh");
                Ok(SessionLease::vacant(self))
            }
        }
    }

    fn record_path(&self, id: &SessionId) -> PathBuf {
        self.directory.join(format!("{}.json", id))
    }

    async fn read_record(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let path = self.record_path(id);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let session: Session = serde_json::from_slice(&data)
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        if session.id != *id {
            return Err(StoreError::IdMismatch {
                path,
                expected: id.to_string(),
                found: session.id.to_string(),
            });
        }

        debug!(session_id = %id, messages = session.len(), "Loaded session");

        Ok(Some(session))
    }

    /// Write to a temp file in the same directory, fsync, then rename over
    /// the record so readers only ever see a complete old or new record.
    async fn write_record(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.record_path(&session.id);
        let data = serde_json::to_vec_pretty(session)?;

        let tmp_path = self
            .directory
            .join(format!(".{}.json.{}.tmp", session.id, uuid::Uuid::new_v4().simple()));

        if let Err(e) = write_synced(&tmp_path, &data).await {
            discard(&tmp_path).await;
            return Err(StoreError::io(tmp_path, e));
        }

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            discard(&tmp_path).await;
            return Err(StoreError::io(path, e));
        }

        debug!(
            session_id = %session.id,
            messages = session.len(),
            bytes = data.len(),
            "Saved session"
        );

        Ok(())
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

async fn discard(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove temp file {}: {}", tmp_path.display(), e);
        }
    }
}

/// A session checked out for one read-modify-write
///
/// Dropping the lease without calling `commit` discards the update and
/// releases the lock.
#[derive(Debug)]
pub struct SessionLease<'a> {
    store: &'a FileSessionStore,
    session: Option<Session>,
    held: Option<(SessionId, KeyGuard<'a>)>,
}

impl<'a> SessionLease<'a> {
    fn vacant(store: &'a FileSessionStore) -> Self {
        Self {
            store,
            session: None,
            held: None,
        }
    }

    /// The loaded session, if a record existed
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Move the loaded session out so it can be extended
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Persist `session` and release the lock
    pub async fn commit(self, session: &Session) -> Result<(), StoreError> {
        match &self.held {
            Some((id, _guard)) => {
                if session.id != *id {
                    return Err(StoreError::IdMismatch {
                        path: self.store.record_path(id),
                        expected: id.to_string(),
                        found: session.id.to_string(),
                    });
                }
                self.store.write_record(session).await
            }
            None => self.store.save(session).await,
        }
    }
}
