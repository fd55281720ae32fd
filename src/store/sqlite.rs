//! SQLite implementation of the result log.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use super::{LogEntry, ResultStore, StoreError};
use crate::http_probe::prelude::*;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS status_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL,
        status_code INTEGER,
        response_time REAL,
        status TEXT NOT NULL,
        error_message TEXT,
        timestamp DATETIME NOT NULL
    )
"#;

const CREATE_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_timestamp ON status_logs(timestamp)";

/// Writers wait this long for a lock held by another connection before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(sqlx::FromRow)]
struct LogRow {
    id: i64,
    url: String,
    status_code: Option<i64>,
    response_time: Option<f64>,
    status: String,
    error_message: Option<String>,
    timestamp: NaiveDateTime,
}

impl TryFrom<LogRow> for LogEntry {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let outcome = row.status.parse::<Outcome>().map_err(|reason| StoreError::Corrupt {
            id: row.id,
            reason,
        })?;
        let status_code = row
            .status_code
            .map(u16::try_from)
            .transpose()
            .map_err(|e| StoreError::Corrupt {
                id: row.id,
                reason: format!("status code out of range: {e}"),
            })?;
        // Timestamps are stored as local wall-clock time.
        let timestamp = Local
            .from_local_datetime(&row.timestamp)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&row.timestamp));

        Ok(LogEntry {
            id: row.id,
            result: ProbeResult {
                url: row.url,
                status_code,
                response_time_seconds: row.response_time,
                outcome,
                error_message: row.error_message,
                timestamp,
            },
        })
    }
}

/// Result log backed by a SQLite database file.
///
/// Every append is a single autocommitted INSERT on a pooled connection, so concurrent
/// cycles are serialized by SQLite itself.
#[derive(Debug, Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    /// Connects to `database_url`, creating the database file if it does not exist.
    /// The schema is not touched; call [`ResultStore::init`] or use [`Self::open`].
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        log::debug!("Connecting to result log at {database_url}");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|source| StoreError::InvalidUrl {
                url: database_url.to_string(),
                source,
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;

        Ok(Self { pool })
    }

    /// Connects and makes sure the schema exists.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let store = Self::connect(database_url).await?;
        store.init().await?;
        log::info!("Result log ready at {database_url}");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn init(&self) -> Result<(), StoreError> {
        for statement in [CREATE_TABLE, CREATE_TIMESTAMP_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(StoreError::Schema)?;
        }
        Ok(())
    }

    async fn append(&self, result: &ProbeResult) -> Result<i64, StoreError> {
        let done = sqlx::query(
            "INSERT INTO status_logs \
             (url, status_code, response_time, status, error_message, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.url)
        .bind(result.status_code.map(i64::from))
        .bind(result.response_time_seconds)
        .bind(result.outcome.as_str())
        .bind(result.error_message.as_deref())
        .bind(result.timestamp.naive_local())
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Append {
            url: result.url.clone(),
            source,
        })?;

        Ok(done.last_insert_rowid())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<LogEntry>, StoreError> {
        let rows: Vec<LogRow> = sqlx::query_as(
            "SELECT id, url, status_code, response_time, status, error_message, timestamp \
             FROM status_logs ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.into_iter().map(LogEntry::try_from).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM status_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(count.max(0) as u64)
    }
}
