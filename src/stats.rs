use crate::models::{DisplayStats, Habit};
use chrono::{Datelike, Local, NaiveDate};

pub fn compute_display_stats(habits: &[Habit]) -> DisplayStats {
    compute_display_stats_at(Local::now().date_naive(), habits)
}

pub fn compute_display_stats_at(today: NaiveDate, habits: &[Habit]) -> DisplayStats {
    // Per-day completion is not part of the habit payload, so this cannot be
    // derived client-side and is reported as zero.
    let completed_today = 0;
    let longest_streak = habits.iter().map(|habit| habit.streak).max().unwrap_or(0);

    DisplayStats {
        completed_today,
        longest_streak,
        active_habits: habits.len(),
        day_of_month: today.day(),
    }
}
