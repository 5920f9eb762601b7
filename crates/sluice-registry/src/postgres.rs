//! PostgreSQL backend
//!
//! Every commit inserts a new row; the row with the highest version is the
//! current snapshot. Two concurrent writers race on `MAX(version) + 1` and the
//! loser's insert fails on the primary key, so the first writer wins that
//! version and the second surfaces a database error.

use async_trait::async_trait;
use sluice_core::CoreError;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info};

use crate::{config::RegistryConfig, error::RegistryError, traits::RegistryStore, RegistryResult};

/// Default table holding snapshot rows
pub const DEFAULT_TABLE: &str = "feast_registry";

/// Backend storing versioned snapshot rows in a PostgreSQL table
pub struct PostgresRegistryStore {
    /// Database connection pool
    pool: PgPool,
    /// Snapshot table
    table: String,
}

impl PostgresRegistryStore {
    /// Connect and make sure the snapshot table exists
    ///
    /// # Example
    /// ```no_run
    /// use sluice_registry::PostgresRegistryStore;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let store = PostgresRegistryStore::new("postgres://localhost/feast", "feast_registry").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(database_url: &str, table: &str) -> RegistryResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| RegistryError::BackendUnavailable(e.to_string()))?;
        Self::with_pool(pool, table).await
    }

    /// Build from registry configuration; `path` names the table
    pub async fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let options = config.connect_options()?;
        let table = config.path.as_deref().unwrap_or(DEFAULT_TABLE);
        let pool = PgPool::connect_with(options)
            .await
            .map_err(|e| RegistryError::BackendUnavailable(e.to_string()))?;
        Self::with_pool(pool, table).await
    }

    /// Use an existing pool
    pub async fn with_pool(pool: PgPool, table: &str) -> RegistryResult<Self> {
        validate_table_name(table)?;
        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> RegistryResult<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version BIGINT PRIMARY KEY,
                snapshot BYTEA NOT NULL,
                written_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }
}

fn validate_table_name(table: &str) -> RegistryResult<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        return Err(CoreError::Configuration(format!("Invalid registry table name '{}'", table)).into());
    }
    Ok(())
}

/// Connection-level failures mean the backend is unreachable
fn unavailable(err: sqlx::Error) -> RegistryError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RegistryError::BackendUnavailable(err.to_string()),
        other => RegistryError::Database(other),
    }
}

#[async_trait]
impl RegistryStore for PostgresRegistryStore {
    async fn read_snapshot(&self) -> RegistryResult<Option<Vec<u8>>> {
        let row = sqlx::query(&format!(
            "SELECT snapshot FROM {} ORDER BY version DESC LIMIT 1",
            self.table
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => Ok(Some(row.try_get::<Vec<u8>, _>("snapshot")?)),
            None => Ok(None),
        }
    }

    async fn write_snapshot(&self, bytes: &[u8]) -> RegistryResult<()> {
        let version: i64 = sqlx::query(&format!(
            r#"
            INSERT INTO {table} (version, snapshot)
            SELECT COALESCE(MAX(version), 0) + 1, $1 FROM {table}
            RETURNING version
            "#,
            table = self.table
        ))
        .bind(bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?
        .try_get("version")?;

        debug!(table = %self.table, version, "wrote registry snapshot row");
        Ok(())
    }

    async fn teardown(&self) -> RegistryResult<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.table))
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        info!(table = %self.table, "dropped registry table");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("feast_registry").is_ok());
        assert!(validate_table_name("registry; DROP TABLE users").is_err());
        assert!(validate_table_name("1registry").is_err());
        assert!(validate_table_name("").is_err());
    }
}
