//! Session & sync controller.
//!
//! Owns the session, the local habit list and every call that mutates either.
//! Local state only changes in response to confirmed server outcomes, and a
//! 401 from any session request tears the session down before anything else
//! happens.

use crate::api::HabitApi;
use crate::errors::{Operation, SyncError};
use crate::models::{Credentials, Habit, NewHabit, Registration, ToggleRequest, View};
use crate::state::{AppState, SyncEvent};
use crate::stats::compute_display_stats;
use crate::storage::CredentialStore;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Removed,
    /// The confirmation gate said no; nothing was sent.
    Declined,
}

/// How `restore_session` settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    Active,
    /// No token was stored.
    SignedOut,
    /// A token was stored but the service rejected it.
    Expired,
}

impl Restored {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

#[derive(Debug, Clone)]
pub struct SyncController<S> {
    api: HabitApi,
    store: S,
    state: Arc<Mutex<AppState>>,
}

impl<S: CredentialStore> SyncController<S> {
    pub fn new(api: HabitApi, store: S) -> Self {
        Self {
            api,
            store,
            state: Arc::new(Mutex::new(AppState::default())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Picks up a stored token, if any, and loads habits for it.
    pub async fn restore_session(&self) -> Restored {
        {
            let mut state = self.state.lock().await;
            let token = match self.store.load().await {
                Ok(token) => token,
                Err(err) => {
                    error!("failed to {}: {err}", Operation::Restore.label());
                    None
                }
            };
            let Some(token) = token else {
                debug!("no stored session");
                state.loading = false;
                return Restored::SignedOut;
            };
            state.begin_session(token);
            info!("restored stored session");
        }

        // Other load failures are logged inside and leave the session up.
        let expired = matches!(self.load_habits().await, Err(SyncError::SessionExpired));
        if self.is_authenticated().await {
            Restored::Active
        } else if expired {
            Restored::Expired
        } else {
            Restored::SignedOut
        }
    }

    /// Replaces the local list with the server's. Fails with
    /// `SyncError::Superseded` if the session ended while the request was in
    /// flight; the returned list is always the one the controller now holds.
    pub async fn load_habits(&self) -> Result<Vec<Habit>, SyncError> {
        let (token, epoch) = self.session_snapshot().await;
        let result = self.api.list_habits(token.as_deref()).await;
        let result = self.settle(Operation::Load, epoch, result).await;
        self.state.lock().await.loading = false;

        let habits = result?;
        self.apply(epoch, SyncEvent::Loaded(habits.clone())).await?;
        debug!(count = habits.len(), "loaded habits");
        Ok(habits)
    }

    pub async fn create_habit(&self, input: NewHabit) -> Result<Habit, SyncError> {
        let (token, epoch) = self.session_snapshot().await;
        let result = self.api.create_habit(token.as_deref(), &input).await;
        let habit = self.settle(Operation::Create, epoch, result).await?;

        self.apply(epoch, SyncEvent::Created(habit.clone())).await?;
        info!(id = %habit.id, "created habit");
        Ok(habit)
    }

    /// Toggles today's checkmark, using the local calendar date.
    pub async fn toggle_checkmark(&self, habit_id: &str) -> Result<u32, SyncError> {
        self.toggle_checkmark_on(habit_id, Local::now().date_naive())
            .await
    }

    pub async fn toggle_checkmark_on(&self, habit_id: &str, date: NaiveDate) -> Result<u32, SyncError> {
        let (token, epoch) = self.session_snapshot().await;
        let request = ToggleRequest {
            habit_id: habit_id.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
        };
        let result = self.api.toggle_checkmark(token.as_deref(), &request).await;
        let streak = self.settle(Operation::Toggle, epoch, result).await?.streak;

        self.apply(
            epoch,
            SyncEvent::StreakChanged {
                id: request.habit_id,
                streak,
            },
        )
        .await?;
        Ok(streak)
    }

    /// Deletes a habit once `confirm` agrees. `confirm` runs before any I/O.
    pub async fn delete_habit(
        &self,
        habit_id: &str,
        confirm: impl FnOnce() -> bool,
    ) -> Result<Deletion, SyncError> {
        if !confirm() {
            debug!(id = habit_id, "delete declined");
            return Ok(Deletion::Declined);
        }

        let (token, epoch) = self.session_snapshot().await;
        let result = self.api.delete_habit(token.as_deref(), habit_id).await;
        self.settle(Operation::Delete, epoch, result).await?;

        self.apply(epoch, SyncEvent::Deleted(habit_id.to_string())).await?;
        info!(id = habit_id, "deleted habit");
        Ok(Deletion::Removed)
    }

    pub async fn logout(&self) -> Result<(), SyncError> {
        // The store write happens under the state lock so a concurrent login
        // cannot interleave between the two.
        let mut state = self.state.lock().await;
        state.end_session();
        state.loading = false;
        info!("logged out");

        self.store.clear().await.inspect_err(|err| {
            error!("failed to {}: {err}", Operation::Logout.label());
        })
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<(), SyncError> {
        let token = self
            .api
            .login(credentials)
            .await
            .inspect_err(|err| error!("failed to {}: {err}", Operation::Login.label()))?
            .token;
        self.start_session(Operation::Login, token).await
    }

    pub async fn signup(&self, registration: &Registration) -> Result<(), SyncError> {
        let token = self
            .api
            .signup(registration)
            .await
            .inspect_err(|err| error!("failed to {}: {err}", Operation::Signup.label()))?
            .token;
        self.start_session(Operation::Signup, token).await
    }

    /// Starts a session from a token issued elsewhere.
    pub async fn adopt_token(&self, token: &str) -> Result<(), SyncError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SyncError::request_failed("token is empty"));
        }
        self.start_session(Operation::AdoptToken, token.to_string())
            .await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.session.authenticated()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn habits(&self) -> Vec<Habit> {
        self.state.lock().await.habits.clone()
    }

    pub async fn view(&self) -> View {
        let state = self.state.lock().await;
        View {
            authenticated: state.session.authenticated(),
            loading: state.loading,
            habits: state.habits.clone(),
            stats: compute_display_stats(&state.habits),
        }
    }

    async fn start_session(&self, op: Operation, token: String) -> Result<(), SyncError> {
        {
            let mut state = self.state.lock().await;
            self.store
                .save(&token)
                .await
                .inspect_err(|err| error!("failed to {}: {err}", op.label()))?;
            state.begin_session(token);
        }
        info!("session started via {}", op.label());

        let _ = self.load_habits().await;
        Ok(())
    }

    async fn session_snapshot(&self) -> (Option<String>, u64) {
        let state = self.state.lock().await;
        (state.session.token().map(str::to_string), state.epoch())
    }

    async fn apply(&self, epoch: u64, event: SyncEvent) -> Result<(), SyncError> {
        if self.state.lock().await.apply_from(epoch, event) {
            return Ok(());
        }
        debug!("discarding response from an ended session");
        Err(SyncError::Superseded)
    }

    /// Interprets a finished request. Expiry ends the session it was issued
    /// under; a newer session is left alone. The lock is held across the
    /// store clear so the token removal cannot land after a newer save.
    async fn settle<T>(
        &self,
        op: Operation,
        epoch: u64,
        result: Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err.is_session_expired() {
            let mut state = self.state.lock().await;
            if state.epoch() == epoch {
                state.end_session();
                warn!("session expired during {}", op.label());
                if let Err(clear_err) = self.store.clear().await {
                    error!("failed to clear expired token: {clear_err}");
                }
            }
        } else {
            error!("failed to {}: {err}", op.label());
        }

        Err(err)
    }
}
