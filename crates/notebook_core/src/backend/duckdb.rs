use duckdb::types::ValueRef;
use duckdb::Connection;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;

use super::{QueryBackend, QueryError};

/// Embedded analytics store. DuckDB connections are not `Sync`, so a single
/// connection sits behind a mutex; handler queries are short-lived.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    pub fn open(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }
}

impl From<duckdb::Error> for QueryError {
    fn from(err: duckdb::Error) -> Self {
        QueryError::new(err.to_string())
    }
}

impl QueryBackend for DuckDbBackend {
    fn run_query(&self, sql: &str) -> Result<Vec<Value>, QueryError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut rows_json = vec![];
        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::new();
            for (i, col) in row.as_ref().column_names().iter().enumerate() {
                let name = col.to_string();
                let vj = match row.get_ref(i)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Boolean(b) => b.into(),
                    ValueRef::TinyInt(x) => i64::from(x).into(),
                    ValueRef::SmallInt(x) => i64::from(x).into(),
                    ValueRef::Int(x) => i64::from(x).into(),
                    ValueRef::BigInt(x) => x.into(),
                    ValueRef::UTinyInt(x) => u64::from(x).into(),
                    ValueRef::USmallInt(x) => u64::from(x).into(),
                    ValueRef::UInt(x) => u64::from(x).into(),
                    ValueRef::UBigInt(x) => x.into(),
                    ValueRef::Float(x) => f64::from(x).into(),
                    ValueRef::Double(x) => x.into(),
                    ValueRef::Text(s) => String::from_utf8_lossy(s).to_string().into(),
                    other => Value::String(format!("{other:?}")),
                };
                obj.insert(name, vj);
            }
            rows_json.push(Value::Object(obj));
        }
        Ok(rows_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn runs_a_select_and_returns_json_rows() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        backend
            .run_query("CREATE TABLE profiles (id INTEGER, name TEXT)")
            .unwrap();
        backend
            .run_query("INSERT INTO profiles VALUES (1, 'ada'), (2, 'grace')")
            .unwrap();
        let rows = backend
            .run_query("SELECT id, name FROM profiles ORDER BY id")
            .unwrap();
        assert_eq!(rows, vec![json!({"id": 1, "name": "ada"}), json!({"id": 2, "name": "grace"})]);
    }

    #[test]
    fn missing_relation_reports_does_not_exist() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        let err = backend.run_query("SELECT * FROM no_such_table").unwrap_err();
        assert!(err.to_string().contains("does not exist"), "unexpected error: {err}");
    }
}
