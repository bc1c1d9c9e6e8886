/// Table Handle Module
///
/// This module provides the root of every query chain: a handle identifying
/// one target table, owning the clause accumulator the chain methods append
/// to. Chain methods consume and return the handle, so clauses compose in
/// any order; nothing executes until a terminal call compiles the recorded
/// clauses exactly once and runs the result.
///
/// ```ignore
/// let young = Table::new(&db, "user")
///     .select_many(["id", "username"])
///     .where_lt("age", 45)
///     .order_by_asc("age")
///     .find_many()?;
/// ```
use crate::clause::{Dir, Op, QuerySpec};
use crate::compile::{self, Aggregate};
use crate::core::db::{self, executor, Db, Record};
use crate::core::Result;
use crate::result_set::ResultSet;
use crate::row::Row;
use crate::value::Value;
use tracing::trace;

/// A fluent query over one table.
#[derive(Debug, Clone)]
pub struct Table {
    db: Db,
    name: String,
    pk: String,
    spec: QuerySpec,
}

/// Builds a table handle against the process-wide database handle.
///
/// Requires a prior [`db::set_global`] registration; prefer
/// [`Table::new`] with an explicit handle where practical.
pub fn for_table(name: &str) -> Result<Table> {
    Ok(Table::new(&db::global()?, name))
}

impl Table {
    /// Creates a handle for the given table, resolving the primary-key
    /// column from the handle's configuration.
    pub fn new(db: &Db, name: &str) -> Table {
        let pk = db.primary_key_for(name).to_string();
        Table {
            db: db.clone(),
            name: name.to_string(),
            pk,
            spec: QuerySpec::new(),
        }
    }

    /// Overrides the primary-key column for this chain.
    pub fn primary_key(mut self, column: &str) -> Self {
        self.pk = column.to_string();
        self
    }

    // ==================== Chain methods ====================

    /// Adds one column to the select list. Select calls are cumulative;
    /// once any column is named, returned fields are restricted to exactly
    /// the named list.
    pub fn select(mut self, column: &str) -> Self {
        self.spec.push_select([column]);
        self
    }

    /// Adds several columns to the select list, preserving the given
    /// order. Equivalent to calling `select` once per element.
    pub fn select_many<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.push_select(columns);
        self
    }

    /// Adds a filter with an explicit operator. Filters combine with
    /// logical AND in call order.
    pub fn where_op(mut self, column: &str, op: Op, value: impl Into<Value>) -> Self {
        trace!(column, op = op.as_sql(), "recording filter");
        self.spec.push_filter(column, op, value.into());
        self
    }

    /// Adds a `column = value` filter.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Eq, value)
    }

    /// Adds a `column != value` filter.
    pub fn where_ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Ne, value)
    }

    /// Adds a `column < value` filter.
    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Lt, value)
    }

    /// Adds a `column <= value` filter.
    pub fn where_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Lte, value)
    }

    /// Adds a `column > value` filter.
    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Gt, value)
    }

    /// Adds a `column >= value` filter.
    pub fn where_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Op::Gte, value)
    }

    /// Adds a `column LIKE pattern` filter.
    pub fn where_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.where_op(column, Op::Like, pattern)
    }

    /// Adds an ascending ORDER BY term. Multiple calls compose in call
    /// order.
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.spec.push_order(column, Dir::Asc);
        self
    }

    /// Adds a descending ORDER BY term.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.spec.push_order(column, Dir::Desc);
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, n: u64) -> Self {
        self.spec.push_limit(n);
        self
    }

    /// Skips the first `n` matching rows.
    pub fn offset(mut self, n: u64) -> Self {
        self.spec.push_offset(n);
        self
    }

    /// The compiled SELECT text for the current chain, for logging and
    /// diagnostics.
    pub fn to_sql(&self) -> Result<String> {
        Ok(compile::select(&self.name, &self.spec)?.sql)
    }

    // ==================== Terminal calls ====================

    /// Looks up one row by primary key. Zero matches is an absent result,
    /// not an error.
    pub fn find_one(mut self, id: impl Into<Value>) -> Result<Option<Row>> {
        let pk = self.pk.clone();
        self.spec.push_filter(&pk, Op::Eq, id.into());
        self.find_first()
    }

    /// Fetches the first row matching the recorded clauses, if any.
    pub fn find_first(mut self) -> Result<Option<Row>> {
        self.spec.push_limit(1);
        let stmt = compile::select(&self.name, &self.spec)?;
        let record = executor::fetch_one(&self.db, &stmt)?;
        Ok(record.map(|r| Row::from_record(self.db.clone(), self.name.clone(), self.pk.clone(), r)))
    }

    /// Fetches every row matching the recorded clauses, wrapped for
    /// dirty tracking and persistence.
    pub fn find_many(self) -> Result<Vec<Row>> {
        let stmt = compile::select(&self.name, &self.spec)?;
        let records = executor::fetch_all(&self.db, &stmt)?;
        Ok(records
            .into_iter()
            .map(|r| Row::from_record(self.db.clone(), self.name.clone(), self.pk.clone(), r))
            .collect())
    }

    /// Fetches every matching row as a plain decoded record, without row
    /// wrappers or persistence.
    pub fn find_array(self) -> Result<Vec<Record>> {
        let stmt = compile::select(&self.name, &self.spec)?;
        executor::fetch_all(&self.db, &stmt)
    }

    /// Wraps the chain in a lazy result set. The query runs on first
    /// access; bulk operations on the set reuse these filter clauses.
    pub fn find_result_set(self) -> ResultSet {
        ResultSet::from_table(self.db, self.name, self.pk, self.spec)
    }

    /// Counts the rows matching the recorded filters.
    pub fn count(self) -> Result<i64> {
        let stmt = compile::aggregate(&self.name, &self.spec, Aggregate::Count, None)?;
        let value = executor::fetch_scalar(&self.db, &stmt)?;
        Ok(value.as_i64().unwrap_or(0))
    }

    /// Sums the given column over the matching rows.
    pub fn sum(self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Sum, column)
    }

    /// Averages the given column over the matching rows.
    pub fn avg(self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Avg, column)
    }

    /// Minimum of the given column over the matching rows.
    pub fn min(self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Min, column)
    }

    /// Maximum of the given column over the matching rows.
    pub fn max(self, column: &str) -> Result<Value> {
        self.aggregate(Aggregate::Max, column)
    }

    fn aggregate(self, function: Aggregate, column: &str) -> Result<Value> {
        let stmt = compile::aggregate(&self.name, &self.spec, function, Some(column))?;
        executor::fetch_scalar(&self.db, &stmt)
    }

    /// Starts a fresh, unsaved row for this table. Nothing is written
    /// until `save()`.
    pub fn create(self) -> Row {
        Row::new_row(self.db, self.name, self.pk)
    }

    /// Deletes every row matching the recorded filters with one statement,
    /// returning the affected-row count.
    pub fn delete_many(self) -> Result<usize> {
        let stmt = compile::delete(&self.name, &self.spec)?;
        executor::execute(&self.db, &stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Db {
        Db::open_in_memory().unwrap()
    }

    #[test]
    fn test_chain_records_clauses_without_executing() {
        // No user table exists; building the chain must not touch the
        // backend.
        let table = Table::new(&test_db(), "user")
            .select("username")
            .where_lt("age", 45)
            .order_by_asc("age")
            .limit(2);
        assert_eq!(
            table.to_sql().unwrap(),
            "SELECT username FROM user WHERE age < ? ORDER BY age ASC LIMIT 2"
        );
    }

    #[test]
    fn test_select_calls_accumulate() {
        let table = Table::new(&test_db(), "user").select("username").select("age");
        assert_eq!(table.to_sql().unwrap(), "SELECT username, age FROM user");

        let table = Table::new(&test_db(), "user").select_many(["username", "age"]);
        assert_eq!(table.to_sql().unwrap(), "SELECT username, age FROM user");
    }

    #[test]
    fn test_filters_and_together() {
        let table = Table::new(&test_db(), "user")
            .where_gte("age", 18)
            .where_ne("username", "guest");
        assert_eq!(
            table.to_sql().unwrap(),
            "SELECT * FROM user WHERE age >= ? AND username != ?"
        );
    }

    #[test]
    fn test_chaining_order_is_free() {
        let db = test_db();
        let a = Table::new(&db, "user").order_by_desc("age").where_lt("age", 45);
        let b = Table::new(&db, "user").where_lt("age", 45).order_by_desc("age");
        assert_eq!(a.to_sql().unwrap(), b.to_sql().unwrap());
    }

    #[test]
    fn test_primary_key_override() {
        let db = test_db();
        db.execute_batch(
            "CREATE TABLE widget (code INTEGER PRIMARY KEY, label TEXT);
             INSERT INTO widget (code, label) VALUES (7, 'seven');",
        )
        .unwrap();

        let row = Table::new(&db, "widget")
            .primary_key("code")
            .find_one(7)
            .unwrap()
            .expect("row should exist");
        assert_eq!(row.get_str("label"), Some("seven"));
    }

    #[test]
    fn test_terminal_on_missing_table_surfaces_backend_error() {
        let result = Table::new(&test_db(), "missing").find_many();
        assert!(matches!(
            result,
            Err(crate::core::OrmError::Database(_))
        ));
    }
}
