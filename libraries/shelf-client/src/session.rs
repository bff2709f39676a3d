//! Persistent session storage.
//!
//! The session survives client restarts through a small key-value store.
//! Keys are fixed so that any front end sharing the store resumes the same
//! session.

use crate::error::{ClientError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Named slots in the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AuthToken,
    RefreshToken,
    UserId,
    IsAdmin,
    AdminRole,
}

impl SessionKey {
    /// Every key the client ever writes.
    pub const ALL: [SessionKey; 5] = [
        SessionKey::AuthToken,
        SessionKey::RefreshToken,
        SessionKey::UserId,
        SessionKey::IsAdmin,
        SessionKey::AdminRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AuthToken => "authToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::UserId => "userId",
            SessionKey::IsAdmin => "isAdmin",
            SessionKey::AdminRole => "adminRole",
        }
    }
}

/// Key-value storage backing the session.
///
/// Implementations must be cheap to call; the client reads and writes on
/// every login, refresh and logout.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;

    fn set(&self, key: SessionKey, value: &str) -> Result<()>;

    fn remove(&self, key: SessionKey) -> Result<()>;
}

/// Tokens and identity held by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

impl Session {
    /// Read a previously persisted session. Empty values count as absent.
    pub fn load(store: &dyn SessionStore) -> Self {
        let get = |key: SessionKey| store.get(key).filter(|value| !value.is_empty());
        Self {
            access_token: get(SessionKey::AuthToken),
            refresh_token: get(SessionKey::RefreshToken),
            user_id: get(SessionKey::UserId),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user_id.is_none()
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-lifetime store.
///
/// Clones share the same map, so a second client built from a clone sees
/// what the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<SessionKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| ClientError::Storage("memory store poisoned".into()))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.lock().ok()?.get(&key).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        self.lock()?.remove(&key);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// Store persisted as a flat JSON object on disk.
///
/// The whole file is rewritten on every change; a missing or unreadable file
/// is treated as an empty session.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing contents.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::Storage("file store poisoned".into()))?;
        let mut updated = entries.clone();
        apply(&mut updated);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
            }
        }

        let contents = serde_json::to_string_pretty(&updated)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(&self.path, contents).map_err(|e| ClientError::Storage(e.to_string()))?;

        *entries = updated;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.entries.lock().ok()?.get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: SessionKey) -> Result<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }
}
