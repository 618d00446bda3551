use rusqlite::Connection;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

mod achievements;
mod points;
mod progress;
mod schema;
mod users;

pub use points::MAX_LEADERBOARD;
pub use progress::AwardPolicy;

pub type DBResult<T> = rusqlite::Result<T>;

/// Handle to the learnboard database. Queries are methods on this type,
/// grouped by table in the submodules.
pub struct Db {
    connection: Mutex<Connection>,
    award_policy: AwardPolicy,
}

impl Db {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DBResult<Self> {
        log::debug!("[Db::open] Opening database at {}", path.as_ref().display());
        Self::with_connection(Connection::open(path)?)
    }

    /// A private database that disappears when dropped.
    pub fn open_in_memory() -> DBResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> DBResult<Self> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            connection: Mutex::new(connection),
            award_policy: AwardPolicy::default(),
        })
    }

    /// Sets when [`Db::apply_update`] adds an update's points.
    pub fn with_award_policy(mut self, award_policy: AwardPolicy) -> Self {
        self.award_policy = award_policy;
        self
    }

    /// Locks the shared connection for the duration of one operation.
    pub(crate) fn connect(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-query leaves SQLite itself consistent; keep serving.
        self.connection.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates every table and index, and seeds the achievement catalog.
    pub fn initialize(&self) -> DBResult<()> {
        let connection = self.connect();

        log::debug!("[initialize] creating Users table...");
        connection.execute(schema::USERS_SCHEMA, [])?;

        log::debug!("[initialize] creating UserPoints table...");
        connection.execute(schema::USER_POINTS_SCHEMA, [])?;

        log::debug!("[initialize] creating UserProgress table...");
        connection.execute(schema::USER_PROGRESS_SCHEMA, [])?;
        connection.execute_batch(schema::USER_PROGRESS_INDEXES)?;

        log::debug!("[initialize] creating Achievements tables...");
        connection.execute(schema::ACHIEVEMENTS_SCHEMA, [])?;
        connection.execute(schema::USER_ACHIEVEMENTS_SCHEMA, [])?;

        let seeded = achievements::seed_catalog(&connection)?;
        log::debug!("[initialize] seeded {seeded} new achievement definitions");

        Ok(())
    }
}

/// Turns a uniqueness violation into `Ok(false)` so that inserts can report
/// "already there" instead of failing. Any other error passes through.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            log::trace!("[swallow_constraint_violation] Ignoring duplicate row: {err}");
            Ok(false)
        }
        err => Err(err),
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Db;
    use crate::models::{NewUser, User};

    pub fn db() -> Db {
        let db = Db::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    pub fn user(db: &Db, email: &str) -> User {
        db.insert_user(&NewUser {
            name: String::from("Test User"),
            email: email.to_string(),
            password_hash: None,
        })
        .unwrap()
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let db = test_support::db();
        db.initialize().unwrap();

        let count: i64 = db
            .connect()
            .query_row("SELECT COUNT(*) FROM Achievements", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count as usize, crate::achievements::CATALOG.len());
    }

    #[test]
    fn file_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnboard.db");

        let id = {
            let db = Db::open(&path).unwrap();
            db.initialize().unwrap();
            test_support::user(&db, "persist@example.com").id
        };

        let reopened = Db::open(&path).unwrap();
        reopened.initialize().unwrap();
        assert!(reopened.query_points(&id).unwrap().is_some());
    }
}
