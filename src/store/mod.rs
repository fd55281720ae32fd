//! The append-only log of probe results.
//!
//! Records are only ever inserted. The engine appends one record per probe and the
//! presentation side reads the most recent entries back.

use async_trait::async_trait;

use crate::http_probe::prelude::*;

pub mod error;
pub mod sqlite;

pub use error::StoreError;
pub use sqlite::SqliteResultStore;

/// A probe result as it was read back from the log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Generated, unique and increasing with every append.
    pub id: i64,
    pub result: ProbeResult,
}

/// Durable storage for probe results.
///
/// Implementations must tolerate concurrent `append` calls from independent cycles.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Creates the schema if it is not there yet. Safe to call repeatedly.
    async fn init(&self) -> Result<(), StoreError>;

    /// Persists one result and returns its generated id.
    async fn append(&self, result: &ProbeResult) -> Result<i64, StoreError>;

    /// The `limit` most recent results, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<LogEntry>, StoreError>;

    /// Total number of stored results.
    async fn count(&self) -> Result<u64, StoreError>;
}
