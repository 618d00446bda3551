use serde::Serialize;

use crate::models::ProgressSnapshot;
use crate::streak::Streak;

/// What an achievement's threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Lessons,
    Exercises,
    Points,
    Streak,
}

impl AchievementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::Lessons => "lessons",
            AchievementKind::Exercises => "exercises",
            AchievementKind::Points => "points",
            AchievementKind::Streak => "streak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub required_points: u32,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
}

pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "first-lesson",
        name: "First Steps",
        description: "Complete your first lesson",
        icon: "🌱",
        required_points: 1,
        kind: AchievementKind::Lessons,
    },
    Achievement {
        id: "lesson-explorer",
        name: "Explorer",
        description: "Complete 5 lessons",
        icon: "🧭",
        required_points: 5,
        kind: AchievementKind::Lessons,
    },
    Achievement {
        id: "first-exercise",
        name: "Hello, Code",
        description: "Pass your first exercise",
        icon: "💻",
        required_points: 1,
        kind: AchievementKind::Exercises,
    },
    Achievement {
        id: "exercise-master",
        name: "Problem Solver",
        description: "Pass 10 exercises",
        icon: "🏆",
        required_points: 10,
        kind: AchievementKind::Exercises,
    },
    Achievement {
        id: "points-500",
        name: "High Scorer",
        description: "Earn 500 points",
        icon: "⭐",
        required_points: 500,
        kind: AchievementKind::Points,
    },
    Achievement {
        id: "streak-7",
        name: "On Fire",
        description: "Learn 7 days in a row",
        icon: "🔥",
        required_points: 7,
        kind: AchievementKind::Streak,
    },
];

/// Looks up an achievement definition by id.
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|achievement| achievement.id == id)
}

/// How a user stands against one achievement.
///
/// `unlocked` is computed from the counts the client already has; `awarded`
/// is whether the server has a record of it. The two can disagree: nothing
/// here persists an award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    pub achievement: &'static Achievement,
    pub progress: u32,
    pub unlocked: bool,
    pub awarded: bool,
}

impl std::fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let a = self.achievement;
        let mark = match (self.unlocked, self.awarded) {
            (_, true) => "earned",
            (true, false) => "unlocked",
            (false, false) => "locked",
        };
        write!(
            f,
            "{} {:<16} {:>4}/{:<4} [{}] {}",
            a.icon,
            a.name,
            self.progress.min(a.required_points),
            a.required_points,
            mark,
            a.description
        )
    }
}

fn count(snapshot: &ProgressSnapshot, streak: &Streak, kind: AchievementKind) -> u32 {
    match kind {
        AchievementKind::Lessons => snapshot.completed_lessons.len() as u32,
        AchievementKind::Exercises => snapshot.completed_exercises.len() as u32,
        AchievementKind::Points => snapshot.points,
        AchievementKind::Streak => streak.current,
    }
}

/// Evaluates every catalog entry against a snapshot and the local streak.
pub fn evaluate(snapshot: &ProgressSnapshot, streak: &Streak) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|achievement| {
            let progress = count(snapshot, streak, achievement.kind);
            AchievementStatus {
                achievement,
                progress,
                unlocked: progress >= achievement.required_points,
                awarded: snapshot.achievements.iter().any(|id| id == achievement.id),
            }
        })
        .collect()
}
