use crate::api::HabitApi;
use crate::config::ClientConfig;
use crate::controller::SyncController;
use crate::errors::SyncError;
use crate::storage::FileCredentialStore;

pub type FileController = SyncController<FileCredentialStore>;

pub fn connect(config: &ClientConfig) -> Result<FileController, SyncError> {
    let api = HabitApi::new(&config.api_url)?;
    let store = FileCredentialStore::new(config.token_path.clone());
    Ok(SyncController::new(api, store))
}
