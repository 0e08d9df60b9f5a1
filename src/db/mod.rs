//! Dedup persistence for incremental downloads
//!
//! One table, `seen_items`, keyed by the `(scope, owner_id, item_id)`
//! triple. Once a key is recorded, every future lookup reports it done until
//! the scope is externally cleared.
//!
//! The interface the rest of the crate depends on is the [`DedupStore`]
//! trait; [`Database`] is the provided SQLite implementation.
//!
//! ## Submodules
//!
//! - [`migrations`] — database lifecycle and schema creation

use crate::error::Result;
use crate::types::DedupKey;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePool;

mod migrations;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Keyed lookups the orchestrator needs for incremental mode.
///
/// Implementations must be durable within a run: after `mark_done` returns,
/// every later `is_done` for the same key reports `true`.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether this item was already processed in its scope
    async fn is_done(&self, key: &DedupKey<'_>) -> Result<bool>;

    /// Record a successfully processed item, with its fetched metadata
    async fn mark_done(&self, key: &DedupKey<'_>, snapshot: &Value) -> Result<()>;
}

/// SQLite-backed dedup store
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Close the connection pool.
    ///
    /// Outstanding writes are flushed; the handle is unusable afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Number of recorded items for one owner in one scope
    pub async fn count_scope(&self, scope: crate::types::Scope, owner_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM seen_items WHERE scope = ? AND owner_id = ?",
        )
        .bind(scope.as_str())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Forget every recorded item for one owner in one scope.
    ///
    /// Returns the number of rows removed. The next incremental run over
    /// that collection re-downloads everything.
    pub async fn clear_scope(&self, scope: crate::types::Scope, owner_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM seen_items WHERE scope = ? AND owner_id = ?")
            .bind(scope.as_str())
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DedupStore for Database {
    async fn is_done(&self, key: &DedupKey<'_>) -> Result<bool> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM seen_items WHERE scope = ? AND owner_id = ? AND item_id = ? LIMIT 1",
        )
        .bind(key.scope.as_str())
        .bind(key.owner_id)
        .bind(key.item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn mark_done(&self, key: &DedupKey<'_>, snapshot: &Value) -> Result<()> {
        // INSERT OR IGNORE keeps re-marking idempotent
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO seen_items (scope, owner_id, item_id, snapshot, recorded_at)
            VALUES (?, ?, ?, ?, strftime('%s', 'now'))
            "#,
        )
        .bind(key.scope.as_str())
        .bind(key.owner_id)
        .bind(key.item_id)
        .bind(snapshot.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
