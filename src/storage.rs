use crate::errors::SyncError;
use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::error;

/// Key under which the bearer token is kept.
pub const TOKEN_KEY: &str = "token";

/// Durable slot holding the bearer token between runs.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Option<String>, SyncError>> + Send;
    fn save(&self, token: &str) -> impl Future<Output = Result<(), SyncError>> + Send;
    fn clear(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_slots(&self) -> BTreeMap<String, String> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(slots) => slots,
                Err(err) => {
                    error!("failed to parse credential file {}: {err}", self.path.display());
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read credential file {}: {err}", self.path.display());
                BTreeMap::new()
            }
        }
    }

    async fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(slots).map_err(SyncError::storage)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<String>, SyncError> {
        Ok(self
            .read_slots()
            .await
            .remove(TOKEN_KEY)
            .filter(|token| !token.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<(), SyncError> {
        let mut slots = self.read_slots().await;
        slots.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_slots(&slots).await
    }

    async fn clear(&self) -> Result<(), SyncError> {
        let mut slots = self.read_slots().await;
        if slots.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_slots(&slots).await
    }
}

/// In-process slot; clones share the same token.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>, SyncError> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> Result<(), SyncError> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        self.token.lock().await.take();
        Ok(())
    }
}
