//! Session Handling
//!
//! The session credential is an opaque bearer token plus the tenant id
//! returned at login. It is persisted under two keys, read on every
//! protected page entry and cleared on logout. The token is never checked
//! locally; an expired token only shows up as a failed insights request.
//!
//! ## Architecture
//!
//! - **CredentialStore**: key/value persistence (file or memory)
//! - **Session**: explicit credential passed to every data-fetching call
//! - **Guard**: route gating and the `/` dispatcher

pub mod guard;
pub mod store;

pub use guard::{dispatch_root, guard, Admission, Route};
pub use store::{CredentialStore, FileStore, MemoryStore};

use std::path::PathBuf;
use thiserror::Error;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key for the tenant id (written, never read back by the loader)
pub const TENANT_KEY: &str = "tenantId";

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    tenant_id: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, tenant_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            tenant_id,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Read the persisted session; an empty token counts as absent
    pub async fn load(store: &dyn CredentialStore) -> Result<Option<Self>, SessionError> {
        let token = match store.get_item(TOKEN_KEY).await? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };
        let tenant_id = store.get_item(TENANT_KEY).await?;

        Ok(Some(Self { token, tenant_id }))
    }

    /// Write both keys
    pub async fn persist(&self, store: &dyn CredentialStore) -> Result<(), SessionError> {
        store.set_item(TOKEN_KEY, &self.token).await?;
        match &self.tenant_id {
            Some(tenant_id) => store.set_item(TENANT_KEY, tenant_id).await,
            None => store.remove_item(TENANT_KEY).await,
        }
    }

    /// Remove both keys
    pub async fn clear(store: &dyn CredentialStore) -> Result<(), SessionError> {
        store.remove_item(TOKEN_KEY).await?;
        store.remove_item(TENANT_KEY).await
    }
}

/// Credential store errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse session file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to serialize session: {0}")]
    Serialize(String),
}
