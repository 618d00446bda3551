use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use uuid::Uuid;

use crate::{
    lbdb::{now_millis, swallow_constraint_violation, DBResult, Db},
    models::{self, Role},
};

/////*============== USER QUERIES ==============*/
impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(FromSqlError::Other(format!("unknown role '{other}'").into())),
        }
    }
}

impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            role: row.get("role")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Db {
    /// Registers a user together with a zeroed points record.
    ///
    /// Returns `None` without writing anything if the email is taken.
    pub fn insert_user(&self, new_user: &models::NewUser) -> DBResult<Option<models::User>> {
        log::trace!("[insert_user] Inserting user {} into Users...", new_user.email);

        let mut connection = self.connect();
        let tx = connection.transaction()?;

        let user = models::User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: Role::default(),
            created_at: now_millis(),
            updated_at: now_millis(),
        };

        let inserted = tx
            .prepare(
                "INSERT INTO Users ( id,  name,  email,  password_hash,  role,  created_at,  updated_at)
                 VALUES            (:id, :name, :email, :password_hash, :role, :created_at, :updated_at)",
            )?
            .execute(rusqlite::named_params! {
                ":id":            user.id,
                ":name":          user.name,
                ":email":         user.email,
                ":password_hash": user.password_hash,
                ":role":          user.role,
                ":created_at":    user.created_at,
                ":updated_at":    user.updated_at,
            })
            .map_or_else(swallow_constraint_violation, |_| Ok(true))?;

        if !inserted {
            log::info!("[insert_user] Email {} is already registered.", user.email);
            return Ok(None);
        }

        tx.prepare(
            "INSERT INTO UserPoints (user_id, points, level, last_updated)
             VALUES                 (:user_id, 0,     1,    :now)",
        )?
        .execute(rusqlite::named_params! { ":user_id": user.id, ":now": user.created_at })?;

        tx.commit()?;

        log::info!("User {} ({}) has been added to the database.", user.id, user.email);
        Ok(Some(user))
    }

    /// Returns the user registered with `email`, if any.
    pub fn query_user_by_email(&self, email: &str) -> DBResult<Option<models::User>> {
        log::trace!("[query_user_by_email] Looking up {email}");
        let connection = self.connect();

        connection
            .prepare("SELECT * FROM Users WHERE email = :email")?
            .query(rusqlite::named_params! { ":email": email })?
            .next()?
            .map(|row| row.try_into())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::lbdb::test_support;
    use crate::models::{NewUser, Role};

    #[test]
    fn new_users_start_with_zero_points() {
        let db = test_support::db();
        let user = test_support::user(&db, "ada@example.com");

        assert_eq!(user.role, Role::User);
        let points = db.query_points(&user.id).unwrap().unwrap();
        assert_eq!((points.points, points.level), (0, 1));
    }

    #[test]
    fn duplicate_email_inserts_nothing() {
        let db = test_support::db();
        let first = test_support::user(&db, "dup@example.com");

        let second = db
            .insert_user(&NewUser {
                name: String::from("Someone Else"),
                email: String::from("dup@example.com"),
                password_hash: Some(String::from("x$y")),
            })
            .unwrap();
        assert!(second.is_none());

        let board = db.query_leaderboard(10).unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, first.id);
    }

    #[test]
    fn users_can_be_found_by_email() {
        let db = test_support::db();
        let user = test_support::user(&db, "grace@example.com");

        let by_email = db.query_user_by_email("grace@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(by_email.password_hash.is_none());

        assert!(db.query_user_by_email("missing@example.com").unwrap().is_none());
    }
}
