//! File-backed session persistence.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "sessions": {
//!     "01HZX3J5W8R0K3M9Q2T7V6B4NA": { ... SearchSessionSavedObject fields ... }
//!   }
//! }
//! ```
//!
//! Missing and empty files read as an empty store. A corrupt file or one
//! written in another format version is reported as `StoreCorrupt` on write
//! paths, so it is never silently overwritten; read paths log a warning and
//! see an empty store instead.
//!
//! Writes go through a temp file in the same directory followed by a rename.
//! All file I/O runs on Tokio's blocking pool, one operation at a time per
//! client for writes.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use fs_err as fs;
use search_session_protocol::{SearchSessionSavedObject, STORE_FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::SessionsClient;
use crate::error::{Result, SessionError};

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    sessions: BTreeMap<String, SearchSessionSavedObject>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_FORMAT_VERSION,
            sessions: BTreeMap::new(),
        }
    }
}

pub struct FileSessionsClient {
    store: Arc<FileStore>,
}

struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionsClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionsClient {
            store: Arc::new(FileStore {
                path: path.into(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.store.path
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&FileStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|err| SessionError::Io {
                context: "Session store task failed".to_string(),
                source: std::io::Error::other(err),
            })?
    }
}

impl FileStore {
    fn load(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| SessionError::Io {
            context: "Failed to read session store".to_string(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(StoreFile::default());
        }

        let store: StoreFile =
            serde_json::from_str(&content).map_err(|err| SessionError::StoreCorrupt {
                path: self.path.clone(),
                details: err.to_string(),
            })?;

        if store.version != STORE_FORMAT_VERSION {
            return Err(SessionError::StoreCorrupt {
                path: self.path.clone(),
                details: format!(
                    "unsupported version {} (expected {})",
                    store.version, STORE_FORMAT_VERSION
                ),
            });
        }

        Ok(store)
    }

    fn load_for_read(&self) -> Result<StoreFile> {
        match self.load() {
            Err(SessionError::StoreCorrupt { path, details }) => {
                warn!(
                    path = %path.display(),
                    details = %details,
                    "Session store unreadable; treating as empty"
                );
                Ok(StoreFile::default())
            }
            other => other,
        }
    }

    fn save(&self, store: &StoreFile) -> Result<()> {
        let content = serde_json::to_string_pretty(store).map_err(|source| SessionError::Json {
            context: "Failed to serialize session store".to_string(),
            source,
        })?;

        let parent_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent_dir).map_err(|source| SessionError::Io {
            context: "Failed to create session store directory".to_string(),
            source,
        })?;

        let mut temp_file =
            NamedTempFile::new_in(&parent_dir).map_err(|source| SessionError::Io {
                context: "Failed to create temp session store".to_string(),
                source,
            })?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|source| SessionError::Io {
                context: "Failed to write temp session store".to_string(),
                source,
            })?;
        temp_file
            .persist(&self.path)
            .map_err(|err| SessionError::Io {
                context: "Failed to commit session store".to_string(),
                source: err.error,
            })?;

        Ok(())
    }

    fn create(&self, session: &SearchSessionSavedObject) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut store = self.load()?;
        let replaced = store
            .sessions
            .insert(session.session_id.clone(), session.clone())
            .is_some();
        self.save(&store)?;

        debug!(
            session_id = %session.session_id,
            replaced,
            path = %self.path.display(),
            "Search session persisted"
        );
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut store = self.load()?;
        if store.sessions.remove(session_id).is_none() {
            return Err(SessionError::SessionNotFound(session_id.to_string()));
        }
        self.save(&store)?;

        debug!(session_id = %session_id, "Search session deleted");
        Ok(())
    }
}

#[async_trait]
impl SessionsClient for FileSessionsClient {
    async fn create(&self, session: &SearchSessionSavedObject) -> Result<()> {
        session.validate()?;
        let session = session.clone();
        self.run_blocking(move |store| store.create(&session)).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.run_blocking(move |store| store.delete(&session_id)).await
    }

    async fn get(&self, session_id: &str) -> Result<Option<SearchSessionSavedObject>> {
        let session_id = session_id.to_string();
        self.run_blocking(move |store| Ok(store.load_for_read()?.sessions.remove(&session_id)))
            .await
    }

    async fn list(&self) -> Result<Vec<SearchSessionSavedObject>> {
        let mut sessions: Vec<_> = self
            .run_blocking(|store| store.load_for_read())
            .await?
            .sessions
            .into_values()
            .collect();
        sessions.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }
}
