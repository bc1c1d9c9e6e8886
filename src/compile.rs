/// Statement Compilation Module
///
/// This module lowers an accumulated clause list into a single parameterized
/// SQL statement plus the ordered bound values matching its placeholders.
/// Compilation is pure and deterministic: identical clause sequences always
/// produce identical statement/parameter pairs, and nothing here executes
/// against the database.
///
/// Values are always bound through `?` placeholders, never interpolated into
/// the SQL text. Identifiers (table and column names) cannot be
/// parameterized in SQL, so they are validated against a strict pattern
/// before they are spliced into a statement.
use crate::clause::QuerySpec;
use crate::core::{OrmError, Result};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// A compiled statement: SQL text with `?` placeholders and the bound
/// values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Aggregate functions supported by aggregate terminal calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    /// SQL spelling of the aggregate function.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Validates a table or column identifier.
///
/// Returns `OrmError::Validation` for anything outside
/// `[A-Za-z_][A-Za-z0-9_]*`. Identifiers are the one part of a statement
/// placeholders cannot cover, so this is the crate's injection guard.
fn check_ident<'a>(name: &'a str, kind: &str) -> Result<&'a str> {
    if IDENT_RE.is_match(name) {
        Ok(name)
    } else {
        Err(OrmError::Validation(format!(
            "invalid {} identifier: {:?}",
            kind, name
        )))
    }
}

/// Appends `WHERE ...` for the spec's filters, pushing bound values in
/// predicate order. Emits nothing when no filters were recorded.
fn push_where(spec: &QuerySpec, sql: &mut String, params: &mut Vec<Value>) -> Result<()> {
    let mut first = true;
    for (column, op, value) in spec.filters() {
        check_ident(column, "column")?;
        if first {
            sql.push_str(" WHERE ");
            first = false;
        } else {
            sql.push_str(" AND ");
        }
        sql.push_str(column);
        sql.push(' ');
        sql.push_str(op.as_sql());
        sql.push_str(" ?");
        params.push(value.clone());
    }
    Ok(())
}

/// Appends `ORDER BY ...`, `LIMIT n` and `OFFSET n` in that order.
fn push_tail(spec: &QuerySpec, sql: &mut String) -> Result<()> {
    let mut first = true;
    for (column, dir) in spec.order_terms() {
        check_ident(column, "column")?;
        if first {
            sql.push_str(" ORDER BY ");
            first = false;
        } else {
            sql.push_str(", ");
        }
        sql.push_str(column);
        sql.push(' ');
        sql.push_str(dir.as_sql());
    }

    if let Some(limit) = spec.limit() {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = spec.offset() {
        sql.push_str(&format!(" OFFSET {}", offset));
    }
    Ok(())
}

/// Compiles a SELECT statement.
///
/// The column list honors recorded order and defaults to `*` when no select
/// clause was recorded. Filters lower to AND-joined parameterized
/// predicates; ORDER BY terms compose in call order; LIMIT/OFFSET come last.
pub fn select(table: &str, spec: &QuerySpec) -> Result<Statement> {
    check_ident(table, "table")?;

    let columns = spec.select_columns();
    let column_list = if columns.is_empty() {
        "*".to_string()
    } else {
        for column in &columns {
            check_ident(column, "column")?;
        }
        columns.join(", ")
    };

    let mut sql = format!("SELECT {} FROM {}", column_list, table);
    let mut params = Vec::new();
    push_where(spec, &mut sql, &mut params)?;
    push_tail(spec, &mut sql)?;

    Ok(Statement { sql, params })
}

/// Compiles an aggregate SELECT returning a single scalar.
///
/// Aggregates wrap one column (`COUNT` may wrap `*`), ignore any recorded
/// select clauses, and omit ordering and pagination: the backend reduces
/// the filtered rows to one value either way.
pub fn aggregate(
    table: &str,
    spec: &QuerySpec,
    function: Aggregate,
    column: Option<&str>,
) -> Result<Statement> {
    check_ident(table, "table")?;
    let target = match column {
        Some(name) => check_ident(name, "column")?,
        None => "*",
    };

    let mut sql = format!("SELECT {}({}) FROM {}", function.as_sql(), target, table);
    let mut params = Vec::new();
    push_where(spec, &mut sql, &mut params)?;

    Ok(Statement { sql, params })
}

/// Compiles an INSERT of the given column/value pairs, in the given order.
pub fn insert(table: &str, assignments: &[(String, Value)]) -> Result<Statement> {
    check_ident(table, "table")?;

    if assignments.is_empty() {
        return Ok(Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", table),
            params: Vec::new(),
        });
    }

    let mut columns = Vec::with_capacity(assignments.len());
    let mut params = Vec::with_capacity(assignments.len());
    for (column, value) in assignments {
        check_ident(column, "column")?;
        columns.push(column.as_str());
        params.push(value.clone());
    }

    let placeholders = vec!["?"; assignments.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    Ok(Statement { sql, params })
}

/// Compiles an UPDATE of the given assignments, scoped by the spec's
/// filters. Bound values are assignments first, then filter values.
pub fn update(table: &str, assignments: &[(String, Value)], spec: &QuerySpec) -> Result<Statement> {
    check_ident(table, "table")?;

    if assignments.is_empty() {
        return Err(OrmError::Validation(
            "UPDATE requires at least one assignment".to_string(),
        ));
    }

    let mut sql = format!("UPDATE {} SET ", table);
    let mut params = Vec::with_capacity(assignments.len() + spec.filter_count());
    for (i, (column, value)) in assignments.iter().enumerate() {
        check_ident(column, "column")?;
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(column);
        sql.push_str(" = ?");
        params.push(value.clone());
    }
    push_where(spec, &mut sql, &mut params)?;

    Ok(Statement { sql, params })
}

/// Compiles a DELETE scoped by the spec's filters. With no filters this is
/// a full-table delete, mirroring SQL semantics; callers scope bulk deletes
/// with filter clauses.
pub fn delete(table: &str, spec: &QuerySpec) -> Result<Statement> {
    check_ident(table, "table")?;

    let mut sql = format!("DELETE FROM {}", table);
    let mut params = Vec::new();
    push_where(spec, &mut sql, &mut params)?;

    Ok(Statement { sql, params })
}
