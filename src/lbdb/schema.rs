pub const USERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Users (
        id             TEXT        PRIMARY KEY,
        name           TEXT        NOT NULL,
        email          TEXT        NOT NULL    UNIQUE,
        password_hash  TEXT,
        role           TEXT        NOT NULL    DEFAULT 'user'
                                   CHECK (role IN ('user', 'admin')),

        created_at     INTEGER     NOT NULL,
        updated_at     INTEGER     NOT NULL
    )";

pub const USER_POINTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS UserPoints (
        user_id        TEXT        PRIMARY KEY REFERENCES Users(id) ON DELETE CASCADE,
        points         INTEGER     NOT NULL    DEFAULT 0   CHECK (points >= 0),
        level          INTEGER     NOT NULL    DEFAULT 1   CHECK (level >= 1),
        last_updated   INTEGER     NOT NULL
    )";

pub const USER_PROGRESS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS UserProgress (
        id               INTEGER     PRIMARY KEY,
        user_id          TEXT        NOT NULL    REFERENCES Users(id) ON DELETE CASCADE,

        lesson_id        TEXT,
        exercise_id      TEXT,

        completed        BOOLEAN     NOT NULL    DEFAULT 0,
        score            INTEGER,
        completed_at     INTEGER,
        attempts         INTEGER     NOT NULL    DEFAULT 0,
        last_attempt_at  INTEGER,

        CHECK ((lesson_id IS NULL) <> (exercise_id IS NULL))
    )";

// One row per (user, content item)
pub const USER_PROGRESS_INDEXES: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_progress_lesson
        ON UserProgress(user_id, lesson_id) WHERE lesson_id IS NOT NULL;
     CREATE UNIQUE INDEX IF NOT EXISTS idx_progress_exercise
        ON UserProgress(user_id, exercise_id) WHERE exercise_id IS NOT NULL;";

pub const ACHIEVEMENTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Achievements (
        id               TEXT        PRIMARY KEY,
        name             TEXT        NOT NULL,
        description      TEXT        NOT NULL,
        icon             TEXT        NOT NULL,
        required_points  INTEGER     NOT NULL,
        type             TEXT        NOT NULL
                                     CHECK (type IN ('lessons', 'exercises', 'points', 'streak'))
    )";

pub const USER_ACHIEVEMENTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS UserAchievements (
        user_id          TEXT        NOT NULL    REFERENCES Users(id) ON DELETE CASCADE,
        achievement_id   TEXT        NOT NULL    REFERENCES Achievements(id),
        earned_at        INTEGER     NOT NULL,

        UNIQUE (user_id, achievement_id)
    )";
