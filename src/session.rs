//! User session persistence.
//!
//! A session is nothing more than the opaque subject string the identity
//! provider assigned to the signed-in user. It is the join key for every
//! per-user remote call (roster attribute reads/writes, admin listing), and
//! it survives app restarts as a small JSON file on device.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::error::{Error, Result};

/// The signed-in user's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identity subject (the provider's `sub` claim).
    pub subject: String,
}

impl Session {
    /// Create a session for the given subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// On-disk session store.
///
/// When `data_dir` is None the store is a no-op and sessions live only in
/// memory for the process lifetime.
pub struct SessionStore {
    data_dir: Option<PathBuf>,
}

impl SessionStore {
    /// Create a store rooted at the given directory.
    pub fn new(data_dir: Option<impl Into<PathBuf>>) -> Self {
        Self {
            data_dir: data_dir.map(Into::into),
        }
    }

    /// Create a store rooted at the configured data directory.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    fn session_file_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("session.json"))
    }

    /// Load the persisted session, if any.
    ///
    /// A missing or corrupt file is not an error: it logs a warning and
    /// behaves as "not signed in".
    pub fn load(&self) -> Option<Session> {
        let path = self.session_file_path()?;

        if !path.exists() {
            tracing::info!(path = %path.display(), "No existing session file");
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Session>(&contents) {
                Ok(session) => {
                    tracing::info!(subject = session.subject.as_str(), "Loaded session");
                    Some(session)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Corrupt session file, starting fresh");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session file, starting fresh");
                None
            }
        }
    }

    /// Persist the session to disk.
    pub fn save(&self, session: &Session) -> Result<()> {
        let path = match self.session_file_path() {
            Some(p) => p,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Serialization(format!("create data dir: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, json)
            .map_err(|e| Error::Serialization(format!("write session file: {}", e)))?;

        tracing::info!(subject = session.subject.as_str(), "Saved session");
        Ok(())
    }

    /// Remove the persisted session (sign-out).
    pub fn clear(&self) {
        if let Some(path) = self.session_file_path() {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(error = %e, "Failed to remove session file");
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store_is_noop() {
        let store = SessionStore::new(None::<PathBuf>);
        assert!(store.load().is_none());
        assert!(store.save(&Session::new("sub-123")).is_ok());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path()));

        assert!(store.load().is_none());

        let session = Session::new("us-east-1:abc-def");
        store.save(&session).unwrap();

        assert_eq!(store.load(), Some(session));
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();

        let store = SessionStore::new(Some(dir.path()));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_from_config_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            data_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        };

        let store = SessionStore::from_config(&config);
        store.save(&Session::new("sub-123")).unwrap();
        assert_eq!(store.load(), Some(Session::new("sub-123")));

        let in_memory = SessionStore::from_config(&CoreConfig::default());
        assert!(in_memory.load().is_none());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Some(dir.path()));

        store.save(&Session::new("sub-123")).unwrap();
        store.clear();
        assert!(store.load().is_none());
    }
}
