/// Row Wrapper Module
///
/// This module wraps one decoded result record in a mutable object that
/// remembers which fields changed since load. A row holds two maps from
/// column name to value: `original` (as loaded, empty for a freshly created
/// row) and `current` (mutated by setters). The dirty set is derived on
/// demand as the columns where the two disagree, which is what lets
/// `save()` emit a partial UPDATE touching only changed fields.
///
/// A failed write never partially mutates row state: `original` and
/// `current` stay as they were until the backend confirms success.
use crate::clause::{Op, QuerySpec};
use crate::compile;
use crate::core::db::{executor, Db, Record};
use crate::core::{OrmError, Result};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// One table row with dirty-field tracking and persistence.
#[derive(Debug, Clone)]
pub struct Row {
    db: Db,
    table: String,
    pk: String,
    original: Record,
    current: Record,
    is_new: bool,
}

impl Row {
    /// Wraps a decoded backend record.
    pub(crate) fn from_record(db: Db, table: String, pk: String, record: Record) -> Row {
        Row {
            db,
            table,
            pk,
            original: record.clone(),
            current: record,
            is_new: false,
        }
    }

    /// Starts an unsaved row; `save()` will INSERT it.
    pub(crate) fn new_row(db: Db, table: String, pk: String) -> Row {
        Row {
            db,
            table,
            pk,
            original: Record::new(),
            current: Record::new(),
            is_new: true,
        }
    }

    /// Reads a field by name. A column named in neither map is an absent
    /// value, never an error.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.current.get(column)
    }

    /// Reads a field as text. Absent, NULL and non-text values all give
    /// `None`.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Reads a field as an integer.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Reads a field as a float, coercing stored integers.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    /// The row's primary-key value, if loaded or assigned.
    pub fn id(&self) -> Option<&Value> {
        self.get(&self.pk)
    }

    /// Writes a field by name. The backend is untouched until `save()`.
    /// Returns `&mut Self` so setter calls chain.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.current.insert(column.to_string(), value.into());
        self
    }

    /// True until the first successful `save()` of a row built by
    /// `create()`.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Column names whose current value differs from the loaded one,
    /// recomputed on demand.
    pub fn dirty_columns(&self) -> Vec<&str> {
        self.current
            .iter()
            .filter(|(name, value)| self.original.get(*name) != Some(value))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True if any field changed since load.
    pub fn is_dirty(&self) -> bool {
        self.current
            .iter()
            .any(|(name, value)| self.original.get(name) != Some(value))
    }

    /// The row's fields as a JSON object.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.current)?)
    }

    /// Persists the row.
    ///
    /// A new row INSERTs every field present, then reads the generated
    /// primary key back into the row. A loaded row UPDATEs only the dirty
    /// columns, filtered by primary-key equality; with nothing dirty the
    /// call is a no-op that performs zero backend writes.
    ///
    /// Returns `Ok(true)` when a statement was executed and `Ok(false)`
    /// for the no-op case.
    ///
    /// # Errors
    ///
    /// Constraint violations and other backend rejections propagate as
    /// `OrmError::Database`, leaving the in-memory row unmodified. Saving
    /// a loaded row whose primary-key value is unknown (for example a row
    /// fetched with a select list that excludes it) is
    /// `OrmError::Validation`.
    pub fn save(&mut self) -> Result<bool> {
        if self.is_new {
            return self.insert();
        }

        let assignments: Vec<(String, Value)> = self
            .dirty_columns()
            .iter()
            .map(|name| (name.to_string(), self.current[*name].clone()))
            .collect();
        if assignments.is_empty() {
            debug!(table = %self.table, "save with clean row is a no-op");
            return Ok(false);
        }

        let id = self.persisted_id()?;
        let mut spec = QuerySpec::new();
        spec.push_filter(&self.pk, Op::Eq, id);
        let stmt = compile::update(&self.table, &assignments, &spec)?;
        executor::execute(&self.db, &stmt)?;

        // The backend confirmed the write; resynchronize the saved columns.
        for (name, value) in assignments {
            self.original.insert(name, value);
        }
        Ok(true)
    }

    fn insert(&mut self) -> Result<bool> {
        let assignments: Vec<(String, Value)> = self
            .current
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let stmt = compile::insert(&self.table, &assignments)?;
        executor::execute(&self.db, &stmt)?;

        if !self.current.contains_key(&self.pk) {
            let id = self.db.last_insert_id()?;
            self.current.insert(self.pk.clone(), Value::Integer(id));
        }
        self.original = self.current.clone();
        self.is_new = false;
        Ok(true)
    }

    /// Deletes the row from the backend by primary-key equality.
    ///
    /// Consumes the row: the in-memory object is stale once the backend
    /// row is gone, so it cannot be reused. Returns whether a backend row
    /// was actually removed.
    pub fn delete(self) -> Result<bool> {
        let id = self.persisted_id()?;
        let mut spec = QuerySpec::new();
        spec.push_filter(&self.pk, Op::Eq, id);
        let stmt = compile::delete(&self.table, &spec)?;
        let affected = executor::execute(&self.db, &stmt)?;
        Ok(affected > 0)
    }

    /// The primary-key value identifying this row in the backend. Reads
    /// the loaded value first so that reassigning the key column updates
    /// the row it was loaded as.
    fn persisted_id(&self) -> Result<Value> {
        self.original
            .get(&self.pk)
            .or_else(|| self.current.get(&self.pk))
            .cloned()
            .ok_or_else(|| {
                OrmError::Validation(format!(
                    "row in table {:?} has no {:?} value to identify it",
                    self.table, self.pk
                ))
            })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.current.len()))?;
        for (name, value) in &self.current {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
