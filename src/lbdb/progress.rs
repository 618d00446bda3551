use rusqlite::{Connection, OptionalExtension};

use crate::{
    lbdb::{achievements, now_millis, points, DBResult, Db},
    models::{ProgressSnapshot, UpdateCommand},
};

/// When an update's points are added to the user's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwardPolicy {
    /// Every update adds its points, so resubmitting a completion counts
    /// it again.
    #[default]
    EveryUpdate,
    /// Only the first completion of an item, or the first time an
    /// achievement is earned, adds points. Repeats still count attempts.
    FirstCompletion,
}

/// A lesson or exercise, as stored in UserProgress.
#[derive(Debug, Clone, Copy)]
enum ContentItem<'a> {
    Lesson(&'a str),
    Exercise(&'a str),
}

impl ContentItem<'_> {
    fn column(&self) -> &'static str {
        match self {
            ContentItem::Lesson(_) => "lesson_id",
            ContentItem::Exercise(_) => "exercise_id",
        }
    }

    fn id(&self) -> &str {
        match self {
            ContentItem::Lesson(id) | ContentItem::Exercise(id) => id,
        }
    }
}

/////*============== PROGRESS QUERIES ==============*/
/// Marks `item` complete for `user_id`, creating its progress row on the
/// first attempt and counting another attempt otherwise.
///
/// Returns `true` if the item was not already complete.
fn record_completion(
    connection: &Connection,
    user_id: &str,
    item: ContentItem,
    score: u32,
) -> DBResult<bool> {
    let column = item.column();
    let now = now_millis();
    let query_params = rusqlite::named_params! {
        ":user_id": user_id,
        ":item_id": item.id(),
        ":score":   score,
        ":now":     now,
    };

    let already_completed: Option<bool> = connection
        .prepare(&format!(
            "SELECT completed FROM UserProgress WHERE user_id = :user_id AND {column} = :item_id"
        ))?
        .query_row(rusqlite::named_params! { ":user_id": user_id, ":item_id": item.id() }, |row| {
            row.get("completed")
        })
        .optional()?;

    match already_completed {
        Some(completed) => {
            log::trace!("[record_completion] {user_id} attempted {item:?} again");
            connection
                .prepare(&format!(
                    "UPDATE UserProgress
                     SET attempts = attempts + 1,
                         last_attempt_at = :now,
                         completed = 1,
                         completed_at = COALESCE(completed_at, :now),
                         score = MAX(COALESCE(score, 0), :score)
                     WHERE user_id = :user_id AND {column} = :item_id"
                ))?
                .execute(query_params)?;

            Ok(!completed)
        }
        None => {
            log::trace!("[record_completion] {user_id} completed {item:?} for the first time");
            connection
                .prepare(&format!(
                    "INSERT INTO UserProgress
                        ( user_id,  {column},  completed,  score,  completed_at,  attempts,  last_attempt_at)
                     VALUES
                        (:user_id, :item_id,   1,         :score, :now,          1,         :now)"
                ))?
                .execute(query_params)?;

            Ok(true)
        }
    }
}

fn query_completed(connection: &Connection, user_id: &str, column: &str) -> DBResult<Vec<String>> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {column} FROM UserProgress
         WHERE user_id = :user_id AND {column} IS NOT NULL AND completed = 1
         ORDER BY completed_at, id"
    ))?;

    let ids = stmt
        .query_map(rusqlite::named_params! { ":user_id": user_id }, |row| row.get(0))?
        .collect::<DBResult<Vec<String>>>()?;

    Ok(ids)
}

/// Builds the full progress snapshot for `user_id`, or `None` if they have
/// no points record.
fn snapshot_in(connection: &Connection, user_id: &str) -> DBResult<Option<ProgressSnapshot>> {
    let Some(user_points) = points::query_points_in(connection, user_id)? else {
        return Ok(None);
    };

    let last_activity_at: Option<i64> = connection.query_row(
        "SELECT MAX(completed_at) FROM UserProgress WHERE user_id = :user_id AND completed = 1",
        rusqlite::named_params! { ":user_id": user_id },
        |row| row.get(0),
    )?;

    Ok(Some(ProgressSnapshot {
        points: user_points.points,
        level: user_points.level,
        completed_lessons: query_completed(connection, user_id, "lesson_id")?,
        completed_exercises: query_completed(connection, user_id, "exercise_id")?,
        achievements: achievements::query_awarded(connection, user_id)?,
        last_activity_at,
    }))
}

impl Db {
    /// Gathers everything the client shows about `user_id`'s progress.
    pub fn query_progress(&self, user_id: &str) -> DBResult<Option<ProgressSnapshot>> {
        log::trace!("[query_progress] Querying progress for {user_id}");
        snapshot_in(&self.connect(), user_id)
    }

    /// Applies one update to `user_id`'s progress and returns the new snapshot.
    ///
    /// Repeating a completion counts another attempt. Whether it adds points
    /// again is up to the database's [`AwardPolicy`]. Everything happens in
    /// a single transaction. Returns `None` for unknown users.
    pub fn apply_update(
        &self,
        user_id: &str,
        command: &UpdateCommand,
    ) -> DBResult<Option<ProgressSnapshot>> {
        log::trace!("[apply_update] Applying {command:?} for {user_id}");

        let mut connection = self.connect();
        let tx = connection.transaction()?;

        if points::query_points_in(&tx, user_id)?.is_none() {
            log::info!("[apply_update] No points record for {user_id}, ignoring update.");
            return Ok(None);
        }

        let newly_earned = match command {
            UpdateCommand::CompleteLesson { lesson_id, points } => {
                record_completion(&tx, user_id, ContentItem::Lesson(lesson_id), *points)?
            }
            UpdateCommand::CompleteExercise { exercise_id, points } => {
                record_completion(&tx, user_id, ContentItem::Exercise(exercise_id), *points)?
            }
            UpdateCommand::EarnAchievement { achievement_id, .. } => {
                achievements::award(&tx, user_id, achievement_id)?
            }
        };

        let award = match self.award_policy {
            AwardPolicy::EveryUpdate => true,
            AwardPolicy::FirstCompletion => newly_earned,
        };

        if !award {
            log::info!(
                "[apply_update] {user_id} already has {}, no points awarded.",
                command.item_id()
            );
        } else if command.points() > 0 {
            points::add_points(&tx, user_id, command.points())?;
        }

        let snapshot = snapshot_in(&tx, user_id)?;
        tx.commit()?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::AwardPolicy;
    use crate::lbdb::test_support;
    use crate::models::{UpdateAction, UpdateCommand};

    fn command(action: UpdateAction, id: &str, points: u32) -> UpdateCommand {
        UpdateCommand::new(action, id.to_string(), Some(points))
    }

    #[test]
    fn repeated_completion_adds_points_again() {
        let db = test_support::db();
        let user = test_support::user(&db, "lesson@example.com");
        let lesson = command(UpdateAction::CompleteLesson, "app-router", 40);

        let first = db.apply_update(&user.id, &lesson).unwrap().unwrap();
        assert_eq!(first.points, 40);
        assert_eq!(first.completed_lessons, vec![String::from("app-router")]);
        assert!(first.last_activity_at.is_some());

        let second = db.apply_update(&user.id, &lesson).unwrap().unwrap();
        assert_eq!(second.points, 80);
        assert_eq!(second.completed_lessons.len(), 1);

        let attempts: u32 = db
            .connect()
            .query_row(
                "SELECT attempts FROM UserProgress WHERE lesson_id = 'app-router'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(attempts, 2);
    }

    #[test]
    fn lessons_and_exercises_are_tracked_separately() {
        let db = test_support::db();
        let user = test_support::user(&db, "split@example.com");

        db.apply_update(&user.id, &command(UpdateAction::CompleteLesson, "data-fetching", 10))
            .unwrap();
        let snapshot = db
            .apply_update(&user.id, &command(UpdateAction::CompleteExercise, "data-fetching", 20))
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.completed_lessons, vec![String::from("data-fetching")]);
        assert_eq!(snapshot.completed_exercises, vec![String::from("data-fetching")]);
        assert_eq!(snapshot.points, 30);
    }

    #[test]
    fn level_follows_points_across_updates() {
        let db = test_support::db();
        let user = test_support::user(&db, "climb@example.com");

        for (i, points) in [60, 60, 150].into_iter().enumerate() {
            db.apply_update(
                &user.id,
                &command(UpdateAction::CompleteExercise, &format!("ex-{i}"), points),
            )
            .unwrap();
        }

        let snapshot = db.query_progress(&user.id).unwrap().unwrap();
        assert_eq!(snapshot.points, 270);
        assert_eq!(snapshot.level, 3);
    }

    #[test]
    fn achievements_are_recorded_once() {
        let db = test_support::db();
        let user = test_support::user(&db, "ach@example.com");
        let earn = command(UpdateAction::EarnAchievement, "first-lesson", 50);

        let first = db.apply_update(&user.id, &earn).unwrap().unwrap();
        let second = db.apply_update(&user.id, &earn).unwrap().unwrap();

        assert_eq!(first.achievements, vec![String::from("first-lesson")]);
        assert_eq!(second.achievements.len(), 1);
        assert_eq!(second.points, 100);
        assert!(second.last_activity_at.is_none());
    }

    #[test]
    fn first_completion_policy_awards_once() {
        let db = test_support::db().with_award_policy(AwardPolicy::FirstCompletion);
        let user = test_support::user(&db, "once@example.com");
        let lesson = command(UpdateAction::CompleteLesson, "intro", 10);
        let earn = command(UpdateAction::EarnAchievement, "first-lesson", 50);

        db.apply_update(&user.id, &lesson).unwrap();
        db.apply_update(&user.id, &lesson).unwrap();
        db.apply_update(&user.id, &earn).unwrap();
        let snapshot = db.apply_update(&user.id, &earn).unwrap().unwrap();

        assert_eq!(snapshot.points, 60);
        assert_eq!(snapshot.completed_lessons.len(), 1);
        assert_eq!(snapshot.achievements.len(), 1);
    }

    #[test]
    fn unknown_user_is_none() {
        let db = test_support::db();
        let update = command(UpdateAction::CompleteLesson, "intro", 10);

        assert!(db.apply_update("ghost", &update).unwrap().is_none());
        assert!(db.query_progress("ghost").unwrap().is_none());
    }

    #[test]
    fn failed_update_leaves_nothing_behind() {
        let db = test_support::db();
        let user = test_support::user(&db, "rollback@example.com");

        let earn = command(UpdateAction::EarnAchievement, "not-in-catalog", 10);
        assert!(db.apply_update(&user.id, &earn).is_err());

        let snapshot = db.query_progress(&user.id).unwrap().unwrap();
        assert_eq!(snapshot.points, 0);
        assert!(snapshot.achievements.is_empty());
    }
}
