//! SQLite connection provider. Writes go through a single-connection pool; reads use their own pool.
//! When both share one pool, queries are read in full before the cursor is returned.

use crate::error::ProviderError;
use crate::session::{ConnectionProvider, RowCursor, Session, ValueSet};
use crate::sql::{bind_all, builder, row_to_json, Selection};
use async_trait::async_trait;
use futures::StreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://provider.db";
pub const DEFAULT_READ_POOL_SIZE: u32 = 4;

/// Rows buffered between the database and a cursor that is not being read.
const CURSOR_BUFFER: usize = 64;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct SqliteSettings {
    pub database_url: String,
    pub read_pool_size: u32,
}

impl SqliteSettings {
    /// From env `DATABASE_URL` and `PROVIDER_READ_POOL_SIZE`, with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let read_pool_size = get("PROVIDER_READ_POOL_SIZE")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_READ_POOL_SIZE);
        SqliteSettings {
            database_url,
            read_pool_size,
        }
    }
}

impl Default for SqliteSettings {
    fn default() -> Self {
        SqliteSettings {
            database_url: DEFAULT_DATABASE_URL.into(),
            read_pool_size: DEFAULT_READ_POOL_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SqliteConnections {
    reader: SqlitePool,
    writer: SqlitePool,
    stream_rows: bool,
}

impl SqliteConnections {
    /// Opens (creating if missing) the database in WAL mode.
    pub async fn connect(settings: &SqliteSettings) -> Result<Self, ProviderError> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        let reader = SqlitePoolOptions::new()
            .max_connections(settings.read_pool_size.max(1))
            .connect_with(options)
            .await?;
        tracing::info!(url = %settings.database_url, read_pool_size = settings.read_pool_size, "sqlite connections open");
        Ok(SqliteConnections {
            reader,
            writer,
            stream_rows: true,
        })
    }

    /// Reads and writes share one pool (required for `sqlite::memory:`).
    /// Cursors are buffered so an unread cursor never holds the connection a write needs.
    pub fn from_pool(pool: SqlitePool) -> Self {
        SqliteConnections {
            reader: pool.clone(),
            writer: pool,
            stream_rows: false,
        }
    }

    /// Write pool, for schema setup outside the provider.
    pub fn writer(&self) -> &SqlitePool {
        &self.writer
    }

    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

#[async_trait]
impl ConnectionProvider for SqliteConnections {
    type Session = SqliteSession;

    async fn read_handle(&self) -> Result<SqliteSession, ProviderError> {
        Ok(SqliteSession {
            pool: self.reader.clone(),
            stream_rows: self.stream_rows,
        })
    }

    async fn write_handle(&self) -> Result<SqliteSession, ProviderError> {
        Ok(SqliteSession {
            pool: self.writer.clone(),
            stream_rows: self.stream_rows,
        })
    }
}

pub struct SqliteSession {
    pool: SqlitePool,
    stream_rows: bool,
}

#[async_trait]
impl Session for SqliteSession {
    async fn select(
        &self,
        table: &str,
        columns: &[String],
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> Result<RowCursor, ProviderError> {
        let q = builder::select(table, columns, selection, sort_order);
        tracing::debug!(sql = %q.sql, params = ?q.params, streamed = self.stream_rows, "query");
        if !self.stream_rows {
            let fetched = bind_all(sqlx::query(&q.sql), &q.params)
                .fetch_all(&self.pool)
                .await
                .and_then(|rows| rows.iter().map(row_to_json).collect::<Result<Vec<_>, _>>());
            return Ok(match fetched {
                Ok(rows) => RowCursor::from_rows(rows),
                Err(e) => RowCursor::failed(e.into()),
            });
        }
        let (tx, cursor) = RowCursor::channel(CURSOR_BUFFER);
        let pool = self.pool.clone();
        // Producer ends when the result set is exhausted, on the first error, or when the cursor is dropped.
        tokio::spawn(async move {
            let query = bind_all(sqlx::query(&q.sql), &q.params);
            let mut rows = query.fetch(&pool);
            while let Some(next) = rows.next().await {
                let item = next
                    .and_then(|row| row_to_json(&row))
                    .map_err(ProviderError::from);
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });
        Ok(cursor)
    }

    async fn insert(
        &self,
        table: &str,
        null_column_hack: Option<&str>,
        values: &ValueSet,
    ) -> Result<i64, ProviderError> {
        let q = builder::insert(table, null_column_hack, values);
        tracing::debug!(sql = %q.sql, params = ?q.params, "insert");
        let result = bind_all(sqlx::query(&q.sql), &q.params)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update(&self, table: &str, values: &ValueSet, selection: &Selection) -> Result<u64, ProviderError> {
        if values.is_empty() {
            return Err(ProviderError::BadRequest("empty values".into()));
        }
        let q = builder::update(table, values, selection);
        tracing::debug!(sql = %q.sql, params = ?q.params, "update");
        let result = bind_all(sqlx::query(&q.sql), &q.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, table: &str, selection: &Selection) -> Result<u64, ProviderError> {
        let q = builder::delete(table, selection);
        tracing::debug!(sql = %q.sql, params = ?q.params, "delete");
        let result = bind_all(sqlx::query(&q.sql), &q.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
