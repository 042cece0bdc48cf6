//! SQL handler: statement denylist, one genuine execution attempt, then the
//! sample-table and simulated-select fallbacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

use crate::backend::{QueryBackend, QueryError};

pub const DENIAL_MESSAGE: &str =
    "Dangerous operations are not allowed. Use SELECT, INSERT, UPDATE for data operations.";

const SAMPLE_QUERY: &str = "SELECT id FROM profiles LIMIT 5";
const SAMPLE_MESSAGE: &str = "Sample query executed successfully. Note: Custom SQL execution requires additional database permissions.";

/// Result-set payload nested under `data` in the SQL response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPayload {
    pub rows: Vec<Value>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlOutcome {
    pub success: bool,
    pub data: Option<QueryPayload>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Case-insensitive statement screen. `delete` is tolerated only in its
/// `delete from` form; everything on the list is matched as a raw substring
/// of the lowercased query.
pub fn is_denylisted(query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.contains("drop ")
        || q.contains("truncate ")
        || q.contains("alter ")
        || (q.contains("delete ") && !q.contains("delete from"))
}

fn is_select(query: &str) -> bool {
    query.trim().to_lowercase().starts_with("select")
}

/// Run one query through the fallback chain.
///
/// The denylist is checked before anything touches the backend and a
/// rejection is never converted into a simulated success. After that:
/// genuine execution, then the sample-table read when the target relation
/// does not exist, then — for selects only — the fixed simulated result
/// set with the error cleared.
#[tracing::instrument(skip_all)]
pub fn run_sql(backend: &dyn QueryBackend, query: &str) -> SqlOutcome {
    let started = Instant::now();

    if is_denylisted(query) {
        tracing::warn!("query rejected by statement denylist");
        return SqlOutcome {
            success: false,
            data: None,
            error: Some(DENIAL_MESSAGE.to_string()),
            execution_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };
    }

    let attempt = execute_with_sample_fallback(backend, query);

    match attempt {
        Ok(payload) => SqlOutcome {
            success: true,
            data: Some(payload),
            error: None,
            execution_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        },
        Err(err) if is_select(query) => {
            tracing::debug!(%err, "query failed, returning simulated result set");
            SqlOutcome {
                success: true,
                data: Some(simulated_payload(query)),
                error: None,
                execution_time_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            }
        }
        Err(err) => SqlOutcome {
            success: false,
            data: None,
            error: Some(err.to_string()),
            execution_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        },
    }
}

fn execute_with_sample_fallback(
    backend: &dyn QueryBackend,
    query: &str,
) -> Result<QueryPayload, QueryError> {
    match backend.run_query(query) {
        Ok(rows) => Ok(QueryPayload {
            row_count: rows.len(),
            rows,
            simulated: None,
            message: None,
        }),
        Err(err) if err.to_string().contains("does not exist") => {
            match backend.run_query(SAMPLE_QUERY) {
                Ok(rows) => Ok(QueryPayload {
                    row_count: rows.len(),
                    rows,
                    simulated: None,
                    message: Some(SAMPLE_MESSAGE.to_string()),
                }),
                // Surface the original failure, not the sample's.
                Err(_) => Err(err),
            }
        }
        Err(err) => Err(err),
    }
}

fn simulated_payload(query: &str) -> QueryPayload {
    let echoed: String = query.chars().take(100).collect();
    QueryPayload {
        rows: vec![
            json!({ "message": "SQL Execution Demo", "status": "simulated" }),
            json!({ "info": format!("In production, this would execute: {echoed}") }),
            json!({ "note": "Configure database permissions to enable full SQL execution" }),
        ],
        row_count: 3,
        simulated: Some(true),
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DisconnectedBackend, DuckDbBackend};

    #[test]
    fn denylist_covers_ddl_and_bare_delete() {
        assert!(is_denylisted("DROP TABLE users"));
        assert!(is_denylisted("truncate table events"));
        assert!(is_denylisted("ALTER TABLE users ADD col INT"));
        assert!(is_denylisted("delete users where id = 1"));
        assert!(!is_denylisted("DELETE FROM users WHERE id = 1"));
        assert!(!is_denylisted("SELECT * FROM users"));
    }

    #[test]
    fn denylisted_query_fails_even_when_it_starts_with_select() {
        let outcome = run_sql(&DisconnectedBackend, "select 1; drop table users");
        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert_eq!(outcome.error.as_deref(), Some(DENIAL_MESSAGE));
    }

    #[test]
    fn failed_select_returns_the_simulated_three_rows() {
        let outcome = run_sql(&DisconnectedBackend, "SELECT * FROM warehouse.events");
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        let data = outcome.data.unwrap();
        assert_eq!(data.row_count, 3);
        assert_eq!(data.rows.len(), 3);
        assert_eq!(data.simulated, Some(true));
        assert_eq!(data.rows[0]["message"], "SQL Execution Demo");
        assert!(data.rows[1]["info"]
            .as_str()
            .unwrap()
            .starts_with("In production, this would execute: SELECT * FROM warehouse.events"));
    }

    #[test]
    fn simulated_fallback_echoes_at_most_100_characters() {
        let long = format!("select {}", "x".repeat(200));
        let outcome = run_sql(&DisconnectedBackend, &long);
        let data = outcome.data.unwrap();
        let info = data.rows[1]["info"].as_str().unwrap();
        let echoed = info.strip_prefix("In production, this would execute: ").unwrap();
        assert_eq!(echoed.chars().count(), 100);
    }

    #[test]
    fn failed_non_select_propagates_the_error() {
        let outcome = run_sql(&DisconnectedBackend, "INSERT INTO t VALUES (1)");
        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert_eq!(
            outcome.error.as_deref(),
            Some("permission denied for function execute_sql_query")
        );
    }

    #[test]
    fn genuine_execution_returns_rows_and_count() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        backend
            .run_query("CREATE TABLE events (id INTEGER, kind TEXT)")
            .unwrap();
        backend
            .run_query("INSERT INTO events VALUES (1, 'run'), (2, 'save')")
            .unwrap();
        let outcome = run_sql(&backend, "SELECT * FROM events ORDER BY id");
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data.row_count, 2);
        assert_eq!(data.simulated, None);
        assert_eq!(data.rows[0]["kind"], "run");
    }

    #[test]
    fn missing_relation_falls_back_to_the_sample_table() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        backend
            .run_query("CREATE TABLE profiles (id INTEGER)")
            .unwrap();
        backend
            .run_query("INSERT INTO profiles VALUES (1), (2), (3)")
            .unwrap();
        let outcome = run_sql(&backend, "SELECT * FROM not_a_table");
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data.row_count, 3);
        assert_eq!(data.message.as_deref(), Some(SAMPLE_MESSAGE));
        assert_eq!(data.simulated, None);
    }
}
