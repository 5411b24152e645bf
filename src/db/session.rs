use sqlx::pool::PoolConnection;
use sqlx::{Connection, Sqlite};

use super::USER_TABLE;
use crate::models::User;

/// One pooled connection checked out for a single unit of work
///
/// Not shared between requests. Dropping the session hands the connection
/// back to the pool, so it is released on every exit path.
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
        tracing::trace!("Database session acquired");
        Self { conn }
    }

    /// All users in creation order
    #[tracing::instrument(
        name = "db.query",
        skip_all,
        fields(db.system = "sqlite", db.operation = "SELECT", db.sql.table = USER_TABLE)
    )]
    pub async fn list_users(&mut self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, created_at
            FROM "user"
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await
    }

    #[tracing::instrument(
        name = "db.query",
        skip_all,
        fields(db.system = "sqlite", db.operation = "SELECT COUNT", db.sql.table = USER_TABLE)
    )]
    pub async fn count_users(&mut self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&mut *self.conn)
            .await
    }

    /// Delete every row and insert `users` in one transaction
    ///
    /// Either all of `users` end up in the table or the previous contents are kept.
    #[tracing::instrument(
        name = "db.transaction",
        skip_all,
        fields(db.system = "sqlite", db.sql.table = USER_TABLE, rows = users.len())
    )]
    pub async fn replace_users(&mut self, users: &[User]) -> Result<(), sqlx::Error> {
        let mut tx = Connection::begin(&mut *self.conn).await?;

        let deleted = sqlx::query(r#"DELETE FROM "user""#)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for user in users {
            sqlx::query(r#"INSERT INTO "user" (id, name, created_at) VALUES (?, ?, ?)"#)
                .bind(user.id)
                .bind(&user.name)
                .bind(user.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(deleted, inserted = users.len(), "User table replaced");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::trace!("Database session released");
    }
}
