use rusqlite::Connection;

use crate::{
    lbdb::{now_millis, DBResult, Db},
    level, models,
};

/// Largest leaderboard a single query may return.
pub const MAX_LEADERBOARD: usize = 100;

/////*============== POINTS QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::UserPoints {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            user_id: row.get("user_id")?,
            points: row.get("points")?,
            level: row.get("level")?,
            last_updated: row.get("last_updated")?,
        })
    }
}

pub(crate) fn query_points_in(
    connection: &Connection,
    user_id: &str,
) -> DBResult<Option<models::UserPoints>> {
    connection
        .prepare("SELECT * FROM UserPoints WHERE user_id = :user_id")?
        .query(rusqlite::named_params! { ":user_id": user_id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Adds `amount` to `user_id`'s points and raises their stored level to
/// match. Levels never go down. The total stops at `u32::MAX`.
///
/// Returns their new totals.
pub(crate) fn add_points(
    connection: &Connection,
    user_id: &str,
    amount: u32,
) -> DBResult<models::UserPoints> {
    log::trace!("[add_points] Adding {amount} points to {user_id}");

    let points: u32 = connection
        .prepare(
            "UPDATE UserPoints
             SET points = MIN(points + :amount, :max_points), last_updated = :now
             WHERE user_id = :user_id
             RETURNING points",
        )?
        .query_row(
            rusqlite::named_params! {
                ":user_id":    user_id,
                ":amount":     amount,
                ":max_points": u32::MAX,
                ":now":        now_millis(),
            },
            |row| row.get("points"),
        )?;

    connection
        .prepare(
            "UPDATE UserPoints
             SET level = MAX(level, :level)
             WHERE user_id = :user_id
             RETURNING *",
        )?
        .query_row(
            rusqlite::named_params! { ":user_id": user_id, ":level": level::level_for_points(points) },
            |row| models::UserPoints::try_from(row),
        )
        .inspect(|updated| {
            log::info!(
                "[add_points] {user_id}'s new total is {} (+{amount}), level {}",
                updated.points,
                updated.level
            )
        })
}

impl Db {
    /// Queries the points record for `user_id`.
    pub fn query_points(&self, user_id: &str) -> DBResult<Option<models::UserPoints>> {
        log::trace!("[query_points] Querying points for {user_id}");
        query_points_in(&self.connect(), user_id)
    }

    /// The top `limit` users by points. Ties go to whoever got there first.
    pub fn query_leaderboard(&self, limit: usize) -> DBResult<Vec<models::LeaderboardEntry>> {
        log::trace!("[query_leaderboard] Querying top {limit} users");
        let connection = self.connect();

        let mut stmt = connection.prepare(
            "SELECT u.id, u.name, p.points, p.level
             FROM UserPoints p
             JOIN Users u ON u.id = p.user_id
             ORDER BY p.points DESC, p.last_updated ASC
             LIMIT :limit",
        )?;

        let entries = stmt
            .query_map(
                rusqlite::named_params! { ":limit": limit.min(MAX_LEADERBOARD) as i64 },
                |row| {
                    Ok(models::LeaderboardEntry {
                        rank: 0,
                        user_id: row.get("id")?,
                        name: row.get("name")?,
                        points: row.get("points")?,
                        level: row.get("level")?,
                    })
                },
            )?
            .enumerate()
            .map(|(i, entry)| entry.map(|entry| models::LeaderboardEntry { rank: i + 1, ..entry }))
            .collect::<DBResult<Vec<_>>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbdb::test_support;

    #[test]
    fn adding_points_updates_level() {
        let db = test_support::db();
        let user = test_support::user(&db, "lvl@example.com");

        let updated = add_points(&db.connect(), &user.id, 250).unwrap();
        assert_eq!(updated.points, 250);
        assert_eq!(updated.level, 3);

        let again = add_points(&db.connect(), &user.id, 60).unwrap();
        assert_eq!((again.points, again.level), (310, 4));
    }

    #[test]
    fn total_stops_at_u32_max() {
        let db = test_support::db();
        let user = test_support::user(&db, "max@example.com");

        add_points(&db.connect(), &user.id, 4_000_000_000).unwrap();
        let capped = add_points(&db.connect(), &user.id, 4_000_000_000).unwrap();
        assert_eq!(capped.points, u32::MAX);

        let again = add_points(&db.connect(), &user.id, 1).unwrap();
        assert_eq!(again.points, u32::MAX);
    }

    #[test]
    fn leaderboard_orders_by_points() {
        let db = test_support::db();
        let low = test_support::user(&db, "low@example.com");
        let high = test_support::user(&db, "high@example.com");
        add_points(&db.connect(), &low.id, 10).unwrap();
        add_points(&db.connect(), &high.id, 90).unwrap();

        let board = db.query_leaderboard(10).unwrap();
        assert_eq!(board[0].user_id, high.id);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].rank, 2);

        assert_eq!(db.query_leaderboard(1).unwrap().len(), 1);
    }
}
