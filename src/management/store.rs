use std::{collections::BTreeMap, io, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("session storage is corrupt: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Key/value storage for client credentials.
///
/// Mirrors browser local storage: string keys, string values, reads never
/// fail (a missing or unreadable entry is simply absent).
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store, used by tests and one-off invocations.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk.
///
/// The whole file is rewritten on every change while the entry lock is held,
/// so concurrent writers never interleave. The in-memory entries only change
/// once the write succeeded.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Opens the store at `path`; a missing file yields an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = match async_fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => BTreeMap::new(),
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::IoError(e)),
        };

        debug!(path = %path.display(), entries = entries.len(), "opened session store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        if entries.is_empty() {
            return match async_fs::remove_file(&self.path).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(StoreError::IoError(e)),
                _ => Ok(()),
            };
        }

        let json = serde_json::to_string_pretty(entries)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());

        debug!(key, "writing session store");
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);

        debug!(key, "removing from session store");
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}
