use crate::models::Habit;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// A confirmed server outcome to fold into the local habit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Loaded(Vec<Habit>),
    Created(Habit),
    StreakChanged { id: String, streak: u32 },
    Deleted(String),
    Cleared,
}

/// Folds `event` into `habits`. Events apply in arrival order, so the later
/// of two streak updates for the same habit wins.
pub fn apply(mut habits: Vec<Habit>, event: SyncEvent) -> Vec<Habit> {
    match event {
        SyncEvent::Loaded(fresh) => fresh,
        SyncEvent::Created(habit) => {
            habits.insert(0, habit);
            habits
        }
        SyncEvent::StreakChanged { id, streak } => {
            if let Some(habit) = habits.iter_mut().find(|habit| habit.id == id) {
                habit.streak = streak;
            }
            habits
        }
        SyncEvent::Deleted(id) => {
            habits.retain(|habit| habit.id != id);
            habits
        }
        SyncEvent::Cleared => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Session,
    pub habits: Vec<Habit>,
    pub loading: bool,
    epoch: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: Session::default(),
            habits: Vec::new(),
            loading: true,
            epoch: 0,
        }
    }
}

impl AppState {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a new session, invalidating responses still in flight for any
    /// earlier one.
    pub fn begin_session(&mut self, token: String) -> u64 {
        self.epoch += 1;
        self.session.token = Some(token);
        self.habits.clear();
        self.epoch
    }

    pub fn end_session(&mut self) {
        self.epoch += 1;
        self.session.token = None;
        self.habits = apply(std::mem::take(&mut self.habits), SyncEvent::Cleared);
    }

    /// Applies `event` if it was produced under the current session. Returns
    /// whether it was applied.
    pub fn apply_from(&mut self, epoch: u64, event: SyncEvent) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.habits = apply(std::mem::take(&mut self.habits), event);
        true
    }
}
