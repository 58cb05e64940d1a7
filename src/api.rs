use crate::errors::{GENERIC_FAILURE, SyncError};
use crate::models::{
    AuthResponse, Credentials, ErrorPayload, Habit, NewHabit, Registration, ToggleRequest,
    ToggleResponse,
};
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Typed client for the remote habit service.
#[derive(Debug, Clone)]
pub struct HabitApi {
    client: Client,
    base: Url,
}

impl HabitApi {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let base = Url::parse(base_url)
            .map_err(|err| SyncError::Config(format!("api url '{base_url}': {err}")))?;
        if base.cannot_be_a_base() {
            return Err(SyncError::Config(format!("api url '{base_url}' cannot be a base")));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn list_habits(&self, token: Option<&str>) -> Result<Vec<Habit>, SyncError> {
        let request = self.request(Method::GET, &["habits"], token)?;
        decode(self.send(request).await?).await
    }

    pub async fn create_habit(&self, token: Option<&str>, habit: &NewHabit) -> Result<Habit, SyncError> {
        let request = self.request(Method::POST, &["habits"], token)?.json(habit);
        decode(self.send(request).await?).await
    }

    pub async fn delete_habit(&self, token: Option<&str>, habit_id: &str) -> Result<(), SyncError> {
        let request = self.request(Method::DELETE, &["habits", habit_id], token)?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn toggle_checkmark(
        &self,
        token: Option<&str>,
        toggle: &ToggleRequest,
    ) -> Result<ToggleResponse, SyncError> {
        let request = self
            .request(Method::POST, &["checkmarks", "toggle"], token)?
            .json(toggle);
        decode(self.send(request).await?).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, SyncError> {
        let request = self.request(Method::POST, &["auth", "login"], None)?.json(credentials);
        decode(self.send_anonymous(request).await?).await
    }

    pub async fn signup(&self, registration: &Registration) -> Result<AuthResponse, SyncError> {
        let request = self
            .request(Method::POST, &["auth", "register"], None)?
            .json(registration);
        decode(self.send_anonymous(request).await?).await
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, SyncError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| SyncError::Config(format!("api url '{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&str>,
    ) -> Result<RequestBuilder, SyncError> {
        let url = self.endpoint(segments)?;
        debug!("dispatching {method} {url}");
        Ok(self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization_value(token)))
    }

    /// Sends a session request. A 401 is reported as expiry before the body
    /// is looked at.
    async fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(SyncError::SessionExpired);
        }
        ensure_success(response).await
    }

    /// Sends a request made before any session exists, where a 401 means the
    /// credentials were rejected.
    async fn send_anonymous(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        ensure_success(request.send().await?).await
    }
}

pub fn authorization_value(token: Option<&str>) -> String {
    token.map(|token| format!("Bearer {token}")).unwrap_or_default()
}

async fn ensure_success(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await?;
    Err(SyncError::RequestFailed(error_message(&body)))
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|err| SyncError::request_failed(format!("unexpected response body: {err}")))
}
