//! File-backed token persistence
//!
//! The session's token set is kept as one JSON document, by default at
//! `~/.spatialbias/session.json`. Writes go through a sibling temp file and
//! a rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use spatialbias_common::auth::{CredentialError, TokenSet, TokenStore};
use tracing::debug;

use crate::config::loader::home_dir;

const SESSION_FILE: &str = "session.json";

/// Token store writing a JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.spatialbias/session.json`, `None` without a home directory
    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".spatialbias").join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, err: impl std::fmt::Display) -> CredentialError {
        CredentialError::Storage(format!("failed to {action} {}: {err}", self.path.display()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn store(&self, tokens: &TokenSet) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let bytes = serde_json::to_vec_pretty(tokens).map_err(|e| self.storage_error("encode", e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(|e| self.storage_error("write", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.storage_error("restrict permissions of", e))?;
        }

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| self.storage_error("replace", e))?;
        debug!(path = %self.path.display(), "Session tokens stored");
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenSet>, CredentialError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        let tokens = serde_json::from_slice(&bytes).map_err(|e| self.storage_error("parse", e))?;
        Ok(Some(tokens))
    }

    async fn delete(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session tokens deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("delete", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use spatialbias_common::testing::token_set;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn store_then_load_returns_same_tokens() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));
        let tokens = token_set("a1", 300);

        store.store(&tokens).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, Some(tokens));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn load_without_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileTokenStore::new(&path).load().await.unwrap_err();

        assert!(matches!(err, CredentialError::Storage(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.store(&token_set("a1", 300)).await.unwrap();

        store.delete().await.unwrap();
        store.delete().await.unwrap();

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stored_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.store(&token_set("a1", 300)).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
