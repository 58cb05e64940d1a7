use crate::controller::{Deletion, Restored, SyncController};
use crate::errors::{FailurePolicy, Operation, SyncError};
use crate::models::{Credentials, NewHabit, Registration};
use crate::storage::CredentialStore;
use crate::ui::{render_dashboard, render_logged_out, render_stats};
use chrono::NaiveDate;

#[derive(Debug)]
pub struct CommandFailure {
    pub operation: Operation,
    pub error: SyncError,
}

impl CommandFailure {
    fn new(operation: Operation) -> impl FnOnce(SyncError) -> Self {
        move |error| Self { operation, error }
    }

    /// Text for the user, if this failure is one they should see.
    pub fn notice(&self) -> Option<String> {
        if self.error.is_session_expired() {
            return Some("Session expired. Please log in again.".to_string());
        }
        match self.operation.failure_policy() {
            FailurePolicy::Notify => Some(format!(
                "Failed to {}: {}",
                self.operation.label(),
                self.error
            )),
            FailurePolicy::LogOnly => None,
        }
    }
}

pub type CommandResult = Result<String, CommandFailure>;

/// Restores the stored session. A stored token the service rejects is a
/// failure, not a plain logged-out state.
async fn resume<S: CredentialStore>(controller: &SyncController<S>) -> Result<bool, CommandFailure> {
    match controller.restore_session().await {
        Restored::Active => Ok(true),
        Restored::SignedOut => Ok(false),
        Restored::Expired => Err(CommandFailure {
            operation: Operation::Restore,
            error: SyncError::SessionExpired,
        }),
    }
}

pub async fn login<S: CredentialStore>(
    controller: &SyncController<S>,
    credentials: Credentials,
) -> CommandResult {
    controller
        .login(&credentials)
        .await
        .map_err(CommandFailure::new(Operation::Login))?;
    Ok(format!("Logged in.\n{}", render_dashboard(&controller.view().await)))
}

pub async fn signup<S: CredentialStore>(
    controller: &SyncController<S>,
    registration: Registration,
) -> CommandResult {
    controller
        .signup(&registration)
        .await
        .map_err(CommandFailure::new(Operation::Signup))?;
    Ok(format!("Account created.\n{}", render_dashboard(&controller.view().await)))
}

pub async fn set_token<S: CredentialStore>(controller: &SyncController<S>, token: &str) -> CommandResult {
    controller
        .adopt_token(token)
        .await
        .map_err(CommandFailure::new(Operation::AdoptToken))?;
    if !controller.is_authenticated().await {
        return Err(CommandFailure {
            operation: Operation::AdoptToken,
            error: SyncError::SessionExpired,
        });
    }
    Ok("Token stored.\n".to_string())
}

pub async fn logout<S: CredentialStore>(controller: &SyncController<S>) -> CommandResult {
    controller
        .logout()
        .await
        .map_err(CommandFailure::new(Operation::Logout))?;
    Ok("Logged out.\n".to_string())
}

pub async fn list<S: CredentialStore>(controller: &SyncController<S>) -> CommandResult {
    if !resume(controller).await? {
        return Ok(render_logged_out());
    }
    Ok(render_dashboard(&controller.view().await))
}

pub async fn stats<S: CredentialStore>(controller: &SyncController<S>) -> CommandResult {
    if !resume(controller).await? {
        return Ok(render_logged_out());
    }
    Ok(render_stats(&controller.view().await.stats))
}

pub async fn add<S: CredentialStore>(controller: &SyncController<S>, input: NewHabit) -> CommandResult {
    if !resume(controller).await? {
        return Ok(render_logged_out());
    }
    let habit = controller
        .create_habit(input)
        .await
        .map_err(CommandFailure::new(Operation::Create))?;
    Ok(format!("Created habit {} {} [{}]\n", habit.icon, habit.name, habit.id))
}

pub async fn toggle<S: CredentialStore>(
    controller: &SyncController<S>,
    habit_id: &str,
    date: Option<NaiveDate>,
) -> CommandResult {
    if !resume(controller).await? {
        return Ok(render_logged_out());
    }
    let streak = match date {
        Some(date) => controller.toggle_checkmark_on(habit_id, date).await,
        None => controller.toggle_checkmark(habit_id).await,
    }
    .map_err(CommandFailure::new(Operation::Toggle))?;
    Ok(format!("{habit_id}: 🔥 {streak} day streak\n"))
}

pub async fn delete<S: CredentialStore>(
    controller: &SyncController<S>,
    habit_id: &str,
    confirm: impl FnOnce() -> bool,
) -> CommandResult {
    if !resume(controller).await? {
        return Ok(render_logged_out());
    }
    let outcome = controller
        .delete_habit(habit_id, confirm)
        .await
        .map_err(CommandFailure::new(Operation::Delete))?;
    Ok(match outcome {
        Deletion::Removed => format!("Deleted habit {habit_id}\n"),
        Deletion::Declined => "Cancelled.\n".to_string(),
    })
}
