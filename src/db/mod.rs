//! Persistence gateway for the `user` table
//!
//! Owns the SQLite connection pool, creates the schema on startup and hands
//! out one [`Session`] per unit of work.

pub mod seed;
pub mod session;

pub use seed::{reseed, SEED_USER_COUNT};
pub use session::Session;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Table name, quoted where used since `user` reads like a keyword
pub const USER_TABLE: &str = "user";

const CREATE_USER_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id BLOB PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

/// Database handle
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (and create if missing) the SQLite file named by `config.url`
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database URL: {}", config.url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        if !config.echo {
            options = options.disable_statement_logging();
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", config.url))?;

        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Database opened"
        );

        Ok(Self { pool })
    }

    /// Create the `user` table if it does not exist yet
    #[tracing::instrument(
        name = "db.query",
        skip_all,
        fields(db.system = "sqlite", db.operation = "CREATE TABLE", db.sql.table = USER_TABLE)
    )]
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_USER_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create user table")?;

        tracing::debug!("User table ready");
        Ok(())
    }

    /// Check out a connection for one unit of work
    ///
    /// The connection goes back to the pool when the returned session is dropped.
    pub async fn acquire_session(&self) -> Result<Session, sqlx::Error> {
        let conn = self.pool.acquire().await?;
        Ok(Session::new(conn))
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Fresh database file inside a temp dir; keep the dir alive for the test's duration
    pub async fn temp_database() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("test.db").display()),
            max_connections: 5,
            echo: false,
        };
        let db = Database::open(&config).await.unwrap();
        db.ensure_schema().await.unwrap();
        (dir, db)
    }
}
