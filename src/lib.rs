pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::connect;
pub use config::ClientConfig;
pub use controller::{Deletion, Restored, SyncController};
pub use errors::{FailurePolicy, Operation, SyncError};
pub use stats::compute_display_stats;
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
