/// Query Execution Module
///
/// This module runs compiled statements against the shared connection.
/// Each function executes its statement exactly once and either decodes the
/// result rows into dynamically typed records (read path) or reports the
/// affected-row count (write path). Backend rejections surface unmodified
/// as `OrmError::Database`; there are no retries and no interpretation of
/// backend failures here.
use crate::compile::Statement;
use crate::core::db::connection::Db;
use crate::core::Result;
use crate::value::Value;
use rusqlite::params_from_iter;
use std::collections::BTreeMap;
use tracing::debug;

/// One decoded result row: column name to value, with absent columns simply
/// missing from the map.
pub type Record = BTreeMap<String, Value>;

/// Executes a read statement and decodes every result row.
pub fn fetch_all(db: &Db, stmt: &Statement) -> Result<Vec<Record>> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "executing query");
    db.with_conn(|conn| {
        let mut prepared = conn.prepare(&stmt.sql)?;
        let columns: Vec<String> = prepared.column_names().into_iter().map(String::from).collect();

        let rows = prepared
            .query_map(params_from_iter(stmt.params.iter()), |row| {
                let mut record = Record::new();
                for (i, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), Value::from(row.get_ref(i)?));
                }
                Ok(record)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    })
}

/// Executes a read statement and decodes the first result row, if any.
///
/// Zero matching rows is an absent result, not an error.
pub fn fetch_one(db: &Db, stmt: &Statement) -> Result<Option<Record>> {
    Ok(fetch_all(db, stmt)?.into_iter().next())
}

/// Executes an aggregate statement and decodes its single scalar column.
pub fn fetch_scalar(db: &Db, stmt: &Statement) -> Result<Value> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "executing scalar query");
    db.with_conn(|conn| {
        let mut prepared = conn.prepare(&stmt.sql)?;
        let value = prepared.query_row(params_from_iter(stmt.params.iter()), |row| {
            Ok(Value::from(row.get_ref(0)?))
        })?;
        Ok(value)
    })
}

/// Executes a write statement and reports the affected-row count.
pub fn execute(db: &Db, stmt: &Statement) -> Result<usize> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "executing write");
    db.with_conn(|conn| {
        let affected = conn.execute(&stmt.sql, params_from_iter(stmt.params.iter()))?;
        Ok(affected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OrmError;

    fn test_db() -> Db {
        let db = Db::open_in_memory().unwrap();
        db.execute_batch(
            "
            CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT, value REAL);
            INSERT INTO test (name, value) VALUES ('Alice', 123.45);
            INSERT INTO test (name, value) VALUES ('Bob', 678.90);
            INSERT INTO test (name, value) VALUES (NULL, NULL);
        ",
        )
        .unwrap();
        db
    }

    fn raw(sql: &str, params: Vec<Value>) -> Statement {
        Statement {
            sql: sql.to_string(),
            params,
        }
    }

    #[test]
    fn test_fetch_all_decodes_records() {
        let db = test_db();
        let rows = fetch_all(&db, &raw("SELECT * FROM test ORDER BY id", vec![])).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Alice".into())));
        assert_eq!(rows[0].get("value"), Some(&Value::Real(123.45)));
        // Stored NULL decodes as an explicit Null value.
        assert_eq!(rows[2].get("name"), Some(&Value::Null));
    }

    #[test]
    fn test_fetch_all_binds_parameters() {
        let db = test_db();
        let rows = fetch_all(
            &db,
            &raw(
                "SELECT name FROM test WHERE value > ?",
                vec![Value::Real(200.0)],
            ),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Bob".into())));
    }

    #[test]
    fn test_fetch_one_absent_is_none() {
        let db = test_db();
        let row = fetch_one(
            &db,
            &raw("SELECT * FROM test WHERE id = ?", vec![Value::Integer(99)]),
        )
        .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_fetch_scalar() {
        let db = test_db();
        let count = fetch_scalar(&db, &raw("SELECT COUNT(*) FROM test", vec![])).unwrap();
        assert_eq!(count, Value::Integer(3));
    }

    #[test]
    fn test_execute_reports_affected_rows() {
        let db = test_db();
        let affected = execute(
            &db,
            &raw(
                "UPDATE test SET value = ? WHERE name IS NOT NULL",
                vec![Value::Real(1.0)],
            ),
        )
        .unwrap();
        assert_eq!(affected, 2);
    }

    #[test]
    fn test_backend_error_propagates_unmodified() {
        let db = test_db();
        let result = fetch_all(&db, &raw("SELECT * FROM nonexistent", vec![]));
        match result {
            Err(OrmError::Database(e)) => assert!(e.to_string().contains("no such table")),
            other => panic!("Expected Database error, got {:?}", other),
        }
    }
}
