use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    achievements::{self, AchievementStatus},
    level::LevelProgress,
    models::ProgressSnapshot,
    streak::{self, Streak},
};

/// Whether the snapshot shows a completion on `today` (local time).
pub fn active_on(progress: &ProgressSnapshot, today: NaiveDate) -> bool {
    progress.last_activity_at.and_then(streak::activity_date) == Some(today)
}

/// Every view derived from one progress snapshot and the local streak.
pub struct Dashboard<'a> {
    pub progress: &'a ProgressSnapshot,
    pub streak: &'a Streak,
    pub level: LevelProgress,
    pub achievements: Vec<AchievementStatus>,
}

impl<'a> Dashboard<'a> {
    pub fn new(progress: &'a ProgressSnapshot, streak: &'a Streak) -> Self {
        Self {
            progress,
            streak,
            level: LevelProgress::from_points(progress.points),
            achievements: achievements::evaluate(progress, streak),
        }
    }
}

impl std::fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let earned = self.achievements.iter().filter(|status| status.awarded).count();

        write!(
            f,
            "**Progress:**\n\
             \t{}\n\
             \tLessons completed:   {}\n\
             \tExercises completed: {}\n\
             \t{}\n\
             \n\
             **Achievements ({earned}/{}):**\n\
             \t{}",
            self.level.to_string().replace('\n', "\n\t"),
            self.progress.completed_lessons.len(),
            self.progress.completed_exercises.len(),
            self.streak,
            self.achievements.len(),
            self.achievements.iter().join("\n\t"),
        )
    }
}
