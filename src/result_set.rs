/// Result Set Module
///
/// This module provides the lazy, ordered collection of rows produced by
/// one query chain. The backing query executes on first access to the rows
/// (length, iteration, or an indexed element) and the decoded rows are then
/// cached for the set's lifetime; the query never runs twice.
///
/// The set also retains the originating filter clauses, which is what lets
/// bulk operations compile to a single filtered statement: `delete()` and
/// the `set()`/`save()` pair are one round trip regardless of how many rows
/// match. Bulk writes bypass per-row dirty tracking by contract; rows
/// already materialized in the cache may go stale afterward.
use crate::clause::QuerySpec;
use crate::compile::{self, Aggregate};
use crate::core::db::{executor, Db};
use crate::core::Result;
use crate::row::Row;
use crate::value::Value;
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use tracing::debug;

/// A lazily materialized query result with single-statement bulk
/// operations.
#[derive(Debug)]
pub struct ResultSet {
    db: Db,
    table: String,
    pk: String,
    spec: QuerySpec,
    cache: OnceCell<Vec<Row>>,
    pending: BTreeMap<String, Value>,
}

impl ResultSet {
    pub(crate) fn from_table(db: Db, table: String, pk: String, spec: QuerySpec) -> ResultSet {
        ResultSet {
            db,
            table,
            pk,
            spec,
            cache: OnceCell::new(),
            pending: BTreeMap::new(),
        }
    }

    /// The materialized rows, executing the backing query on first call
    /// and serving the cached decoding afterwards.
    pub fn rows(&self) -> Result<&[Row]> {
        let rows = self.cache.get_or_try_init(|| {
            debug!(table = %self.table, "materializing result set");
            let stmt = compile::select(&self.table, &self.spec)?;
            let records = executor::fetch_all(&self.db, &stmt)?;
            Ok::<_, crate::core::OrmError>(
                records
                    .into_iter()
                    .map(|r| {
                        Row::from_record(
                            self.db.clone(),
                            self.table.clone(),
                            self.pk.clone(),
                            r,
                        )
                    })
                    .collect(),
            )
        })?;
        Ok(rows)
    }

    /// Number of matching rows; materializes on first call.
    pub fn len(&self) -> Result<usize> {
        Ok(self.rows()?.len())
    }

    /// True when no rows match; materializes on first call.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.rows()?.is_empty())
    }

    /// The row at the given position, if any; materializes on first call.
    pub fn get(&self, index: usize) -> Result<Option<&Row>> {
        Ok(self.rows()?.get(index))
    }

    /// Iterates the materialized rows.
    pub fn iter(&self) -> Result<std::slice::Iter<'_, Row>> {
        Ok(self.rows()?.iter())
    }

    /// Records a pending field assignment for the next bulk `save()`.
    /// The backend is untouched until then.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.pending.insert(column.to_string(), value.into());
        self
    }

    /// Applies the pending assignments to every matching row with one
    /// UPDATE over the originating filter clauses.
    ///
    /// This bypasses per-row dirty tracking: all matching backend rows
    /// acquire the new values, and any rows this set already materialized
    /// keep their old in-memory field values. Returns the affected-row
    /// count; with no pending assignments the call is a no-op returning
    /// zero.
    pub fn save(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<(String, Value)> = self
            .pending
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let stmt = compile::update(&self.table, &assignments, &self.spec)?;
        let affected = executor::execute(&self.db, &stmt)?;
        self.pending.clear();
        Ok(affected)
    }

    /// Deletes every matching row with one DELETE over the originating
    /// filter clauses, consuming the set. One round trip regardless of the
    /// result size.
    pub fn delete(self) -> Result<usize> {
        let stmt = compile::delete(&self.table, &self.spec)?;
        executor::execute(&self.db, &stmt)
    }

    // Aggregate terminals bypass materialization entirely: they compile an
    // aggregate statement scoped by the originating filters and return its
    // scalar without touching the row cache.

    /// Counts the matching rows in the backend.
    pub fn count(&self) -> Result<i64> {
        let stmt = compile::aggregate(&self.table, &self.spec, Aggregate::Count, None)?;
        let value = executor::fetch_scalar(&self.db, &stmt)?;
        Ok(value.as_i64().unwrap_or(0))
    }

    /// Sums the given column over the matching rows.
    pub fn sum(&self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Sum, column)
    }

    /// Averages the given column over the matching rows.
    pub fn avg(&self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Avg, column)
    }

    /// Minimum of the given column over the matching rows.
    pub fn min(&self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Min, column)
    }

    /// Maximum of the given column over the matching rows.
    pub fn max(&self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Max, column)
    }

    fn aggregate(&self, function: Aggregate, column: &str) -> Result<Value> {
        let stmt = compile::aggregate(&self.table, &self.spec, function, Some(column))?;
        executor::fetch_scalar(&self.db, &stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn test_db() -> Db {
        let db = Db::open_in_memory().unwrap();
        db.execute_batch(
            "
            CREATE TABLE user (id INTEGER PRIMARY KEY, username TEXT, description TEXT, age INTEGER);
            INSERT INTO user (id, username, description, age) VALUES (1, 'john', 'Admin User', 30);
            INSERT INTO user (id, username, description, age) VALUES (2, 'test', 'Testing User', 50);
            INSERT INTO user (id, username, description, age) VALUES (3, 'guest', 'Guest User', 40);
        ",
        )
        .unwrap();
        db
    }

    fn young_users(db: &Db) -> ResultSet {
        Table::new(db, "user").where_lt("age", 45).find_result_set()
    }

    #[test]
    fn test_construction_does_not_execute() {
        let db = Db::open_in_memory().unwrap();
        // The table does not exist; only materialization can notice.
        let set = Table::new(&db, "missing").find_result_set();
        assert!(set.len().is_err());
    }

    #[test]
    fn test_materializes_once_and_caches() {
        let db = test_db();
        let set = young_users(&db);
        assert_eq!(set.len().unwrap(), 2);

        // Mutate the table behind the cache; the set keeps serving the
        // rows decoded by its one execution.
        db.execute_batch("DELETE FROM user").unwrap();
        assert_eq!(set.len().unwrap(), 2);
        assert_eq!(set.get(0).unwrap().unwrap().get_str("username"), Some("john"));
    }

    #[test]
    fn test_iteration_order_follows_query() {
        let db = test_db();
        let set = Table::new(&db, "user")
            .order_by_desc("age")
            .find_result_set();
        let names: Vec<_> = set
            .iter()
            .unwrap()
            .map(|row| row.get_str("username").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["test", "guest", "john"]);
    }

    #[test]
    fn test_bulk_delete_reuses_originating_filters() {
        let db = test_db();
        let affected = young_users(&db).delete().unwrap();
        assert_eq!(affected, 2);
        assert_eq!(Table::new(&db, "user").count().unwrap(), 1);
    }

    #[test]
    fn test_bulk_update_applies_to_all_matches() {
        let db = test_db();
        let mut set = young_users(&db);
        set.set("age", 90);
        let affected = set.save().unwrap();
        assert_eq!(affected, 2);
        assert_eq!(
            Table::new(&db, "user").where_eq("age", 90).count().unwrap(),
            2
        );
    }

    #[test]
    fn test_bulk_save_without_pending_is_noop() {
        let db = test_db();
        let mut set = young_users(&db);
        assert_eq!(set.save().unwrap(), 0);
    }

    #[test]
    fn test_bulk_update_bypasses_cached_rows() {
        let db = test_db();
        let mut set = young_users(&db);
        // Materialize first, then bulk-write.
        assert_eq!(set.len().unwrap(), 2);
        set.set("age", 90);
        set.save().unwrap();

        // The cached copies are stale by contract; the backend moved on.
        assert_eq!(set.get(0).unwrap().unwrap().get_i64("age"), Some(30));
        let fresh = Table::new(&db, "user").find_one(1).unwrap().unwrap();
        assert_eq!(fresh.get_i64("age"), Some(90));
    }

    #[test]
    fn test_aggregates_bypass_materialization() {
        let db = test_db();
        let set = young_users(&db);
        assert_eq!(set.count().unwrap(), 2);
        assert_eq!(set.sum("age").unwrap(), Value::Integer(70));
        assert_eq!(set.avg("age").unwrap(), Value::Real(35.0));
        assert_eq!(set.min("age").unwrap(), Value::Integer(30));
        assert_eq!(set.max("age").unwrap(), Value::Integer(40));

        // Aggregates read the live table even when the cache is untouched.
        db.execute_batch("DELETE FROM user WHERE id = 1").unwrap();
        assert_eq!(set.count().unwrap(), 1);
    }
}
