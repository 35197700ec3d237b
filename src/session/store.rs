//! Credential Stores
//!
//! Key/value persistence for the session credential. [`FileStore`] keeps
//! the keys in a small TOML file so a login survives between runs;
//! [`MemoryStore`] lives for one process.
//!
//! The session file holds a bearer token: on unix it is created readable
//! by its owner only. A file that no longer parses blocks reads until the
//! next login overwrites it or a logout deletes it.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::SessionError;

/// String key/value storage for persisted client state
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a key; `None` when it was never set or has been removed
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a key, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Remove a key; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

// ============================================
// File-backed store
// ============================================

/// TOML file of string keys, re-read on every access
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/insights-dashboard/session.toml`, or `./session.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("insights-dashboard").join("session.toml"))
            .unwrap_or_else(|| PathBuf::from("./session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    error: e.to_string(),
                })
            }
        };

        toml::from_str(&content).map_err(|e| SessionError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    /// Like `read_all`, but a file that no longer parses reads as empty so
    /// the next write replaces it
    async fn read_or_reset(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match self.read_all().await {
            Err(SessionError::Parse { path, error }) => {
                tracing::warn!(path = ?path, error = %error, "Discarding unreadable session file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    /// Replace the file in one step: write a sibling temp file readable only
    /// by the owner, then rename it over the target
    async fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let content =
            toml::to_string(items).map_err(|e| SessionError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let tmp = self.temp_path();

        // Left behind by an interrupted write
        remove_if_exists(&tmp).await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await.map_err(|e| io_error(tmp.as_path(), e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| io_error(tmp.as_path(), e))?;
        file.sync_all().await.map_err(|e| io_error(tmp.as_path(), e))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(self.path.as_path(), e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), SessionError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(path, e)),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut items = self.read_or_reset().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items).await
    }

    /// Removing the last key deletes the file
    async fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut items = self.read_or_reset().await?;
        items.remove(key);
        if items.is_empty() {
            return remove_if_exists(&self.path).await;
        }
        self.write_all(&items).await
    }
}

// ============================================
// In-memory store
// ============================================

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
