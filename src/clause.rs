/// Clause Accumulation Module
///
/// This module defines the clause descriptors a query chain records and the
/// accumulator that holds them. Accumulation is inert: nothing here touches
/// the database. A terminal call on the owning table handle compiles the
/// recorded clauses exactly once (see `compile`) and executes the result.
use crate::value::Value;

/// Comparison operators usable in filter clauses.
///
/// Filters combine with logical AND in insertion order; there is no OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `LIKE`
    Like,
}

impl Op {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "LIKE",
        }
    }
}

/// Sort direction for ORDER BY clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Asc,
    Desc,
}

impl Dir {
    /// SQL spelling of the direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Dir::Asc => "ASC",
            Dir::Desc => "DESC",
        }
    }
}

/// One recorded query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Columns added to the select list, in call order
    Select(Vec<String>),
    /// One AND-joined filter predicate
    Filter {
        column: String,
        op: Op,
        value: Value,
    },
    /// One ORDER BY term
    OrderBy { column: String, dir: Dir },
    /// Row limit; the last recorded limit wins
    Limit(u64),
    /// Row offset; the last recorded offset wins
    Offset(u64),
}

/// The ordered clause list one table handle accumulates before compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    clauses: Vec<Clause>,
}

impl QuerySpec {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        QuerySpec::default()
    }

    /// Appends select columns. Select calls are cumulative: columns add to
    /// the list, they never replace it.
    pub fn push_select<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.clauses.push(Clause::Select(columns));
        }
    }

    /// Appends one filter predicate.
    pub fn push_filter(&mut self, column: &str, op: Op, value: Value) {
        self.clauses.push(Clause::Filter {
            column: column.to_string(),
            op,
            value,
        });
    }

    /// Appends one ORDER BY term.
    pub fn push_order(&mut self, column: &str, dir: Dir) {
        self.clauses.push(Clause::OrderBy {
            column: column.to_string(),
            dir,
        });
    }

    /// Records a row limit.
    pub fn push_limit(&mut self, n: u64) {
        self.clauses.push(Clause::Limit(n));
    }

    /// Records a row offset.
    pub fn push_offset(&mut self, n: u64) {
        self.clauses.push(Clause::Offset(n));
    }

    /// All recorded clauses in insertion order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The explicit select list, flattened in call order. Empty means no
    /// select clause was recorded and the compiler falls back to `*`.
    pub fn select_columns(&self) -> Vec<&str> {
        self.clauses
            .iter()
            .filter_map(|c| match c {
                Clause::Select(cols) => Some(cols.iter().map(String::as_str)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Filter predicates in insertion order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, Op, &Value)> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Filter { column, op, value } => Some((column.as_str(), *op, value)),
            _ => None,
        })
    }

    /// Number of recorded filter predicates.
    pub fn filter_count(&self) -> usize {
        self.filters().count()
    }

    /// ORDER BY terms in call order.
    pub fn order_terms(&self) -> impl Iterator<Item = (&str, Dir)> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::OrderBy { column, dir } => Some((column.as_str(), *dir)),
            _ => None,
        })
    }

    /// The effective limit, if any was recorded.
    pub fn limit(&self) -> Option<u64> {
        self.clauses
            .iter()
            .rev()
            .find_map(|c| match c {
                Clause::Limit(n) => Some(*n),
                _ => None,
            })
    }

    /// The effective offset, if any was recorded.
    pub fn offset(&self) -> Option<u64> {
        self.clauses
            .iter()
            .rev()
            .find_map(|c| match c {
                Clause::Offset(n) => Some(*n),
                _ => None,
            })
    }
}
