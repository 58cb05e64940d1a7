use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The service rejected the bearer token; the session has been torn down.
    #[error("Session expired")]
    SessionExpired,
    #[error("{0}")]
    RequestFailed(String),
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// The session ended while the request was in flight; its outcome was
    /// not applied.
    #[error("session ended before the response arrived")]
    Superseded,
    #[error("credential store: {0}")]
    Storage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }

    pub fn storage(err: impl std::error::Error) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::RequestFailed(err.to_string())
        } else {
            Self::NetworkUnavailable(err.to_string())
        }
    }
}

/// Controller operations, named so the presentation layer can look up how a
/// failure of each one should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Restore,
    Load,
    Create,
    Toggle,
    Delete,
    Login,
    Signup,
    AdoptToken,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Show the failure message to the user.
    Notify,
    /// Emit a diagnostic only; the UI keeps its prior state.
    LogOnly,
}

impl Operation {
    // Load and toggle stay silent on failure. Worth revisiting: a failed
    // toggle currently looks identical to a toggle that never happened.
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Restore | Self::Load | Self::Toggle => FailurePolicy::LogOnly,
            Self::Create
            | Self::Delete
            | Self::Login
            | Self::Signup
            | Self::AdoptToken
            | Self::Logout => FailurePolicy::Notify,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Restore => "restore session",
            Self::Load => "fetch habits",
            Self::Create => "create habit",
            Self::Toggle => "toggle checkmark",
            Self::Delete => "delete habit",
            Self::Login => "log in",
            Self::Signup => "sign up",
            Self::AdoptToken => "store token",
            Self::Logout => "log out",
        }
    }
}
