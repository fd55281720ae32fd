//! Error types for the result log.

use thiserror::Error;

/// Errors that can occur while talking to the result log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database URL could not be parsed.
    #[error("Invalid database URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// The database could not be opened or created.
    #[error("Failed to connect to result log: {0}")]
    Connect(#[source] sqlx::Error),

    /// Creating the table or its index failed.
    #[error("Failed to prepare result log schema: {0}")]
    Schema(#[source] sqlx::Error),

    /// A single record could not be written.
    #[error("Failed to log result for {url}: {source}")]
    Append {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// Reading records back failed.
    #[error("Failed to query result log: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored row does not describe a valid probe result.
    #[error("Record {id} is not a valid probe result: {reason}")]
    Corrupt { id: i64, reason: String },
}
