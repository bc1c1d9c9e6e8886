/// SQL Value Module
///
/// This module provides the tagged value type used everywhere the ORM
/// touches data: bound statement parameters, decoded result columns, and
/// the field maps inside row objects. It mirrors SQLite's storage classes
/// (NULL, INTEGER, REAL, TEXT, BLOB) so that any column of any table can be
/// represented without a fixed schema.
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::ser::{Serialize, Serializer};
use std::fmt;

/// A dynamically typed SQL value.
///
/// Values convert from the common Rust primitives via `From`, so call sites
/// can pass `30`, `"john"`, or `Some(3.5)` directly to filter and setter
/// methods.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Blob(Vec<u8>),
}

impl Value {
    /// Returns the integer payload, if this value is an INTEGER.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns this value as a float. INTEGER values coerce, matching
    /// SQLite's own numeric affinity.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the text payload, if this value is TEXT.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the blob payload, if this value is a BLOB.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Returns true if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(t) => write!(f, "{}", t),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl From<Value> for rusqlite::types::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => rusqlite::types::Value::Null,
            Value::Integer(i) => rusqlite::types::Value::Integer(i),
            Value::Real(r) => rusqlite::types::Value::Real(r),
            Value::Text(t) => rusqlite::types::Value::Text(t),
            Value::Blob(b) => rusqlite::types::Value::Blob(b),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(t) => ToSqlOutput::Borrowed(ValueRef::Text(t.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(t) => serializer.serialize_str(t),
            Value::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(30), Value::Integer(30));
        assert_eq!(Value::from(30i64), Value::Integer(30));
        assert_eq!(Value::from(3.5), Value::Real(3.5));
        assert_eq!(Value::from("john"), Value::Text("john".to_string()));
        assert_eq!(Value::from(true), Value::Integer(1));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Value::Integer(42).as_i64(), Some(42));
        assert_eq!(Value::Text("42".into()).as_i64(), None);
        assert_eq!(Value::Integer(42).as_f64(), Some(42.0));
        assert_eq!(Value::Real(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::Text("john".into()).as_str(), Some("john"));
        assert!(Value::Null.is_null());
        assert!(!Value::Integer(0).is_null());
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Text("hi".into()).to_string(), "hi");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "<BLOB: 3 bytes>");
    }

    #[test]
    fn test_roundtrip_through_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (a, b, c, d, e)", []).unwrap();
        conn.execute(
            "INSERT INTO t (a, b, c, d, e) VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![
                Value::Integer(1),
                Value::Real(2.5),
                Value::Text("three".into()),
                Value::Blob(vec![4u8]),
                Value::Null,
            ],
        )
        .unwrap();

        let row: (Value, Value, Value, Value, Value) = conn
            .query_row("SELECT a, b, c, d, e FROM t", [], |row| {
                Ok((
                    row.get_ref(0)?.into(),
                    row.get_ref(1)?.into(),
                    row.get_ref(2)?.into(),
                    row.get_ref(3)?.into(),
                    row.get_ref(4)?.into(),
                ))
            })
            .unwrap();

        assert_eq!(row.0, Value::Integer(1));
        assert_eq!(row.1, Value::Real(2.5));
        assert_eq!(row.2, Value::Text("three".into()));
        assert_eq!(row.3, Value::Blob(vec![4u8]));
        assert_eq!(row.4, Value::Null);
    }

    #[test]
    fn test_serialize_to_json() {
        let json = serde_json::to_string(&Value::Integer(30)).unwrap();
        assert_eq!(json, "30");
        let json = serde_json::to_string(&Value::Text("john".into())).unwrap();
        assert_eq!(json, "\"john\"");
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, "null");
    }
}
