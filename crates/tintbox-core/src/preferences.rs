//! User preferences behind a shared, lazily initialized handle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_THEME: &str = "dark";

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("failed to access preferences {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persisted preference values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: String,
    /// Onboarding hints the user has dismissed.
    pub seen_hints: BTreeSet<String>,
    /// Identifies this install's editing session; keys draft snapshots.
    pub session_id: Option<Uuid>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.into(),
            seen_hints: BTreeSet::new(),
            session_id: None,
        }
    }
}

/// Cloneable handle to the preferences of one install.
///
/// Reads take a shared lock; every mutation takes the write lock briefly.
/// Nothing is written to disk until [`save`](Self::save).
#[derive(Debug, Clone)]
pub struct SettingsService {
    inner: Arc<RwLock<Preferences>>,
    path: PathBuf,
}

impl SettingsService {
    /// In-memory defaults that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Preferences::default())),
            path: path.into(),
        }
    }

    /// Load from `path`, or start from defaults if the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No preferences at {}, starting fresh", path.display());
                Preferences::default()
            }
            Err(source) => return Err(PreferencesError::Io { path, source }),
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(prefs)),
            path,
        })
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        let text = {
            let prefs = self.inner.read();
            serde_json::to_string_pretty(&*prefs).map_err(|source| PreferencesError::Parse {
                path: self.path.clone(),
                source,
            })?
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PreferencesError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| PreferencesError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Preferences {
        self.inner.read().clone()
    }

    pub fn theme(&self) -> String {
        self.inner.read().theme.clone()
    }

    pub fn set_theme(&self, theme: impl Into<String>) {
        self.inner.write().theme = theme.into();
    }

    pub fn has_seen_hint(&self, hint: &str) -> bool {
        self.inner.read().seen_hints.contains(hint)
    }

    /// Returns `true` the first time a hint is marked.
    pub fn mark_hint_seen(&self, hint: &str) -> bool {
        self.inner.write().seen_hints.insert(hint.to_owned())
    }

    /// The session id, generated on first access.
    pub fn session_id(&self) -> Uuid {
        if let Some(id) = self.inner.read().session_id {
            return id;
        }
        let mut prefs = self.inner.write();
        // Another handle may have raced us between the two locks.
        *prefs.session_id.get_or_insert_with(|| {
            let id = Uuid::new_v4();
            info!("Started session {id}");
            id
        })
    }

    /// Forget the session id; the next access generates a new one.
    pub fn reset_session(&self) {
        self.inner.write().session_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_stable_once_generated() {
        let service = SettingsService::new("unused.json");
        let first = service.session_id();
        assert_eq!(service.session_id(), first);
        assert_eq!(service.clone().session_id(), first, "clones share state");

        service.reset_session();
        assert_ne!(service.session_id(), first);
    }

    #[test]
    fn test_hints_and_theme() {
        let service = SettingsService::new("unused.json");
        assert_eq!(service.theme(), DEFAULT_THEME);
        service.set_theme("light");
        assert_eq!(service.theme(), "light");

        assert!(!service.has_seen_hint("split-view"));
        assert!(service.mark_hint_seen("split-view"));
        assert!(!service.mark_hint_seen("split-view"));
        assert!(service.has_seen_hint("split-view"));
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let service = SettingsService::load(&path).unwrap();
        service.set_theme("midnight");
        service.mark_hint_seen("lut-stack");
        let id = service.session_id();
        service.save().unwrap();

        let reloaded = SettingsService::load(&path).unwrap();
        assert_eq!(reloaded.snapshot(), service.snapshot());
        assert_eq!(reloaded.session_id(), id);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            SettingsService::load(&path),
            Err(PreferencesError::Parse { .. })
        ));
    }
}
