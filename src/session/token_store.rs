//! Bearer token persistence

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Where the session token lives between runs
pub trait TokenStore: Send + Sync {
    /// The stored token, or `None` when absent or expired
    fn load(&self) -> AppResult<Option<String>>;

    fn save(&self, token: &str) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token kept in a private JSON file, expiring after a fixed lifetime
pub struct FileTokenStore {
    path: PathBuf,
    ttl: Duration,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>, ttl: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AppResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&self.path)?;
        let stored: StoredToken = match serde_json::from_slice(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Discarding unreadable token file {}: {}", self.path.display(), e);
                self.clear()?;
                return Ok(None);
            }
        };

        if stored.expires_at <= Utc::now() {
            tracing::info!("Stored session token expired at {}", stored.expires_at);
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(stored.token))
    }

    fn save(&self, token: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredToken {
            token: token.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        let body = serde_json::to_vec(&stored)
            .map_err(|e| AppError::Session(format!("Failed to encode token: {}", e)))?;
        fs::write(&self.path, body)?;

        // Owner-only, like a secure cookie is only readable by its origin
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, for tests and embedders that manage persistence
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> AppResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| AppError::Session("Token store lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> AppResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> AppResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}
