//! Query backends for the SQL handler. The handler only ever issues a
//! generic "run this query" call; everything else (fallback chain, result
//! shaping) lives in [`crate::sql`].

pub mod duckdb;

use serde_json::Value;
use std::sync::Arc;

pub use self::duckdb::DuckDbBackend;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A connected relational store. Rows come back as JSON objects keyed by
/// column name.
pub trait QueryBackend: Send + Sync {
    fn run_query(&self, sql: &str) -> Result<Vec<Value>, QueryError>;
}

impl<T: QueryBackend + ?Sized> QueryBackend for Arc<T> {
    fn run_query(&self, sql: &str) -> Result<Vec<Value>, QueryError> {
        (**self).run_query(sql)
    }
}

/// The deployed posture when no store is attached: every query fails with a
/// permissions error, which drives the simulated select fallback in the
/// SQL handler.
pub struct DisconnectedBackend;

impl QueryBackend for DisconnectedBackend {
    fn run_query(&self, _sql: &str) -> Result<Vec<Value>, QueryError> {
        Err(QueryError::new(
            "permission denied for function execute_sql_query",
        ))
    }
}
