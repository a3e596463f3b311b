//! Crash-recovery snapshots of the edit state, one JSON file per session.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::edit::EditConfiguration;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("draft I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt draft {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One saved draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub session_id: Uuid,
    /// Milliseconds since the Unix epoch.
    pub saved_at_ms: u64,
    pub edit: EditConfiguration,
}

/// Directory of draft snapshots keyed by session id.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Write (or overwrite) the draft for `session_id`.
    pub fn save(
        &self,
        session_id: Uuid,
        edit: &EditConfiguration,
    ) -> Result<DraftSnapshot, DraftError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| DraftError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let snapshot = DraftSnapshot {
            session_id,
            saved_at_ms: now_ms(),
            edit: edit.clone(),
        };
        let path = self.path_for(session_id);
        let text = serde_json::to_string_pretty(&snapshot).map_err(|source| DraftError::Corrupt {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, text).map_err(|source| DraftError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Saved draft {}", path.display());
        Ok(snapshot)
    }

    /// The draft for `session_id`, if one was saved.
    pub fn load(&self, session_id: Uuid) -> Result<Option<DraftSnapshot>, DraftError> {
        let path = self.path_for(session_id);
        match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| DraftError::Corrupt { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DraftError::Io { path, source }),
        }
    }

    /// The most recently saved draft across all sessions.
    ///
    /// Unreadable files are skipped with a warning so one bad draft does not
    /// hide the others.
    pub fn latest(&self) -> Result<Option<DraftSnapshot>, DraftError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DraftError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut latest: Option<DraftSnapshot> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let snapshot = std::fs::read_to_string(&path)
                .ok()
                .and_then(|text| serde_json::from_str::<DraftSnapshot>(&text).ok());
            let Some(snapshot) = snapshot else {
                warn!("Skipping unreadable draft {}", path.display());
                continue;
            };
            if latest.as_ref().is_none_or(|l| snapshot.saved_at_ms >= l.saved_at_ms) {
                latest = Some(snapshot);
            }
        }
        Ok(latest)
    }

    /// Delete the draft for `session_id`. Returns whether one existed.
    pub fn discard(&self, session_id: Uuid) -> Result<bool, DraftError> {
        let path = self.path_for(session_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(DraftError::Io { path, source }),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
