//! Database lifecycle and schema migrations.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::SqliteConnection;
use std::path::Path;
use std::str::FromStr;

use super::Database;

impl Database {
    /// Open (or create) the database at `path` and bring the schema up to date.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Apply any migrations newer than the stored schema version
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await?
                .flatten();
        let current_version = current_version.unwrap_or(0);

        if current_version < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: the seen-items table
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("applying database migration v1");

        sqlx::query("BEGIN").execute(&mut *conn).await?;

        let migration = async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS seen_items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    scope TEXT NOT NULL,
                    owner_id TEXT NOT NULL,
                    item_id TEXT NOT NULL,
                    snapshot TEXT,
                    recorded_at INTEGER NOT NULL,
                    UNIQUE (scope, owner_id, item_id)
                )
                "#,
            )
            .execute(&mut *conn)
            .await?;

            sqlx::query(
                r#"
                CREATE INDEX IF NOT EXISTS idx_seen_items_owner
                ON seen_items (scope, owner_id)
                "#,
            )
            .execute(&mut *conn)
            .await?;

            sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (1, strftime('%s', 'now'))")
                .execute(&mut *conn)
                .await?;

            Ok::<(), crate::error::Error>(())
        }
        .await;

        match migration {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(())
            }
            Err(e) => {
                // roll back so a partial migration doesn't leave the schema inconsistent
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }
}
