use serde::{Deserialize, Serialize};

// Points awarded when an update request leaves `points` out
pub const DEFAULT_LESSON_POINTS: u32 = 10;
pub const DEFAULT_EXERCISE_POINTS: u32 = 20;
pub const DEFAULT_ACHIEVEMENT_POINTS: u32 = 50;

/// Most points a single update may award.
pub const MAX_POINTS_PER_UPDATE: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,

    /// `None` for accounts created through an OAuth provider.
    pub password_hash: Option<String>,
    pub role: Role,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields needed to register a user. The password is already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// The public face of a user, safe to send over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPoints {
    pub user_id: String,
    pub points: u32,
    pub level: u32,
    pub last_updated: i64,
}

/// Everything the client needs to render a user's progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub points: u32,
    pub level: u32,
    pub completed_lessons: Vec<String>,
    pub completed_exercises: Vec<String>,
    pub achievements: Vec<String>,

    /// Milliseconds since the epoch of the latest completion, if any.
    #[serde(default)]
    pub last_activity_at: Option<i64>,
}

/// The `action` field of an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateAction {
    CompleteLesson,
    CompleteExercise,
    EarnAchievement,
}

/// A validated progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCommand {
    CompleteLesson { lesson_id: String, points: u32 },
    CompleteExercise { exercise_id: String, points: u32 },
    EarnAchievement { achievement_id: String, points: u32 },
}

impl UpdateCommand {
    /// Builds a command, filling in the default award when `points` is `None`.
    pub fn new(action: UpdateAction, item_id: String, points: Option<u32>) -> Self {
        match action {
            UpdateAction::CompleteLesson => Self::CompleteLesson {
                lesson_id: item_id,
                points: points.unwrap_or(DEFAULT_LESSON_POINTS),
            },
            UpdateAction::CompleteExercise => Self::CompleteExercise {
                exercise_id: item_id,
                points: points.unwrap_or(DEFAULT_EXERCISE_POINTS),
            },
            UpdateAction::EarnAchievement => Self::EarnAchievement {
                achievement_id: item_id,
                points: points.unwrap_or(DEFAULT_ACHIEVEMENT_POINTS),
            },
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            Self::CompleteLesson { lesson_id, .. } => lesson_id,
            Self::CompleteExercise { exercise_id, .. } => exercise_id,
            Self::EarnAchievement { achievement_id, .. } => achievement_id,
        }
    }

    pub fn points(&self) -> u32 {
        match self {
            Self::CompleteLesson { points, .. }
            | Self::CompleteExercise { points, .. }
            | Self::EarnAchievement { points, .. } => *points,
        }
    }
}

/// Body of `POST /api/progress/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub user_id: String,
    pub action: UpdateAction,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub name: String,
    pub points: u32,
    pub level: u32,
}

/////*============== WIRE ENVELOPES ==============*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEnvelope {
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEnvelope {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserProfile,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{:<3} {:<24} {:>6} pts  (level {})",
            self.rank, self.name, self.points, self.level
        )
    }
}
