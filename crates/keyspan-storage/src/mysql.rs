use async_trait::async_trait;
use keyspan_core::repository::Result;
use keyspan_core::{Link, Repository, ShortCode, StorageError};
use sqlx::{MySqlPool, Row};
use tracing::{debug, trace};

/// Link storage in a MySQL `links` table.
///
/// Deletes are hard deletes, so a deleted code reads as `NotFound`. The
/// schema ships as [`MYSQL_SCHEMA`](crate::MYSQL_SCHEMA).
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a new pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `links` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(crate::MYSQL_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("links schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn create(&self, link: &Link) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO links (short_code, long_url)
            VALUES (?, ?)
            "#,
        )
        .bind(link.code.as_str())
        .bind(&link.long_url)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                trace!(code = %link.code, "inserted link");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(link.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find(&self, code: &ShortCode) -> Result<Link> {
        let row = sqlx::query(
            r#"
            SELECT long_url
            FROM links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
        Ok(Link::new(code.clone(), long_url))
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM links
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(code.to_string()));
        }
        Ok(())
    }
}
