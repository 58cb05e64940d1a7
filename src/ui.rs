use crate::models::{DisplayStats, Habit, View};
use std::fmt::Write;

pub fn render_dashboard(view: &View) -> String {
    if view.loading {
        return "Loading...\n".to_string();
    }
    if !view.authenticated {
        return render_logged_out();
    }

    let mut out = render_stats(&view.stats);
    out.push('\n');
    if view.habits.is_empty() {
        out.push_str(EMPTY_TEXT);
        return out;
    }
    for habit in &view.habits {
        out.push_str(&render_habit(habit));
    }
    out
}

pub fn render_stats(stats: &DisplayStats) -> String {
    STATS_TEXT
        .replace("{{COMPLETED}}", &stats.completed_today.to_string())
        .replace("{{LONGEST}}", &stats.longest_streak.to_string())
        .replace("{{ACTIVE}}", &stats.active_habits.to_string())
        .replace("{{DAY}}", &stats.day_of_month.to_string())
}

pub fn render_habit(habit: &Habit) -> String {
    let mut line = format!(
        "{} {}  [{}]  {}  🔥 {} day streak\n",
        habit.icon, habit.name, habit.id, habit.color, habit.streak
    );
    if let Some(description) = habit.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(line, "    {description}");
    }
    line
}

pub fn render_logged_out() -> String {
    "Not logged in. Run `habit_tracker login` or `habit_tracker signup` to get started.\n"
        .to_string()
}

const STATS_TEXT: &str = "The Best Habit Tracker
Build better habits, one day at a time

  ✔  Completed Today  {{COMPLETED}}
  🔥 Longest Streak   {{LONGEST}}
  📈 Active Habits    {{ACTIVE}}
  📅 Days in Month    {{DAY}}
";

const EMPTY_TEXT: &str = "No habits yet. Start building better habits today!
Create your first one with `habit_tracker add <NAME>`.
";
