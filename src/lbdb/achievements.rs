use rusqlite::Connection;

use crate::{
    achievements::CATALOG,
    lbdb::{now_millis, swallow_constraint_violation, DBResult},
};

/////*============== ACHIEVEMENT QUERIES ==============*/
/// Inserts every catalog definition that isn't stored yet.
///
/// Returns how many were newly added.
pub(crate) fn seed_catalog(connection: &Connection) -> DBResult<usize> {
    let mut stmt = connection.prepare(
        "INSERT OR IGNORE INTO Achievements ( id,  name,  description,  icon,  required_points,  type)
         VALUES                             (:id, :name, :description, :icon, :required_points, :type)",
    )?;

    CATALOG.iter().try_fold(0, |added, achievement| {
        stmt.execute(rusqlite::named_params! {
            ":id":              achievement.id,
            ":name":            achievement.name,
            ":description":     achievement.description,
            ":icon":            achievement.icon,
            ":required_points": achievement.required_points,
            ":type":            achievement.kind.as_str(),
        })
        .map(|changed| added + changed)
    })
}

/// Records that `user_id` earned `achievement_id`.
///
/// Returns `true` if it was newly earned, false otherwise.
pub(crate) fn award(connection: &Connection, user_id: &str, achievement_id: &str) -> DBResult<bool> {
    log::trace!("[award] Awarding {achievement_id} to {user_id}");

    connection
        .prepare(
            "INSERT INTO UserAchievements ( user_id,  achievement_id,  earned_at)
             VALUES                       (:user_id, :achievement_id, :earned_at)",
        )?
        .execute(rusqlite::named_params! {
            ":user_id":        user_id,
            ":achievement_id": achievement_id,
            ":earned_at":      now_millis(),
        })
        .map_or_else(swallow_constraint_violation, |_| Ok(true))
}

/// Ids of every achievement `user_id` has earned, oldest first.
pub(crate) fn query_awarded(connection: &Connection, user_id: &str) -> DBResult<Vec<String>> {
    let mut stmt = connection.prepare(
        "SELECT achievement_id FROM UserAchievements
         WHERE user_id = :user_id
         ORDER BY earned_at, rowid",
    )?;

    let ids = stmt
        .query_map(rusqlite::named_params! { ":user_id": user_id }, |row| row.get(0))?
        .collect::<DBResult<Vec<String>>>()?;

    Ok(ids)
}
