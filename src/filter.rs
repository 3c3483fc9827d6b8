//! Query-filter compiler.
//!
//! Turns a URL query string into a relational predicate. Each pair follows
//! the grammar `field=$op.value`:
//!
//! ```text
//! ?publisher=$eq.etf1&expired_at=$null&slug=$in.a,b,c
//! ```
//!
//! | token     | SQL           | value                       |
//! |-----------|---------------|-----------------------------|
//! | `eq`      | `=`           | one, after the first `.`    |
//! | `ne`      | `!=`          | one                         |
//! | `gt`      | `>`           | one                         |
//! | `gte`     | `>=`          | one                         |
//! | `lt`      | `<`           | one                         |
//! | `lte`     | `<=`          | one                         |
//! | `in`      | `IN`          | comma-separated list        |
//! | `nin`     | `NOT IN`      | comma-separated list        |
//! | `null`    | `IS NULL`     | none                        |
//! | `notnull` | `IS NOT NULL` | none                        |
//!
//! Compilation is all-or-nothing: one malformed pair fails the whole query
//! and no partial predicate is produced. Values never enter the SQL text;
//! [`Predicate::where_sql`] renders numbered placeholders and
//! [`Predicate::binds`] yields the values in matching order. Field names are
//! restricted to identifiers, so user input cannot inject into the SQL text
//! from either side of the `=`.
//!
//! Clause order is the order the pairs appear on the wire, which keeps the
//! generated SQL reproducible for caching and for tests.

use std::fmt::Write as _;

use thiserror::Error as ThisError;
use url::form_urlencoded;

// ── Operators ─────────────────────────────────────────────────────────────────

/// A filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Null,
    NotNull,
}

impl Op {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            "nin" => Some(Self::Nin),
            "null" => Some(Self::Null),
            "notnull" => Some(Self::NotNull),
            _ => None,
        }
    }

    /// The SQL rendering of this operator.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::Nin => "NOT IN",
            Self::Null => "IS NULL",
            Self::NotNull => "IS NOT NULL",
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, Self::Null | Self::NotNull)
    }

    fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a query string failed to compile. The parameter name is carried for
/// server-side logs; clients get the generic envelope.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FilterError {
    #[error("filter parameter `{0}` is missing the `$` operator prefix")]
    MissingSigil(String),

    #[error("filter parameter `{field}` uses unknown operator `{op}`")]
    UnknownOperator { field: String, op: String },

    #[error("filter parameter `{field}` operator `{op}` requires a `.value`")]
    MissingValue { field: String, op: String },

    #[error("filter field `{0}` is not a valid identifier")]
    InvalidField(String),
}

// ── Predicate ─────────────────────────────────────────────────────────────────

/// One compiled `field <op> values` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub op: Op,
    /// Bind values in placeholder order. Empty for `null`/`notnull`, one
    /// entry per list element for `in`/`nin`, exactly one otherwise.
    pub values: Vec<String>,
}

/// An ordered conjunction of [`Clause`]s plus their bind values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// Compiles a raw query string (no leading `?`).
    ///
    /// Pairs are visited in wire order. The first occurrence of a field wins;
    /// later pairs for the same field are ignored without inspection, the way
    /// first-value query lookups behave. An empty query compiles to the empty
    /// predicate.
    pub fn parse(raw_query: &str) -> Result<Self, FilterError> {
        let mut clauses: Vec<Clause> = Vec::new();

        for (field, value) in form_urlencoded::parse(raw_query.as_bytes()) {
            if clauses.iter().any(|c| c.field == *field) {
                continue;
            }
            if !is_identifier(&field) {
                return Err(FilterError::InvalidField(field.into_owned()));
            }

            let Some(rest) = value.strip_prefix('$') else {
                return Err(FilterError::MissingSigil(field.into_owned()));
            };
            let (op_token, val) = match rest.split_once('.') {
                Some((op, val)) => (op, Some(val)),
                None => (rest, None),
            };
            let Some(op) = Op::parse(op_token) else {
                return Err(FilterError::UnknownOperator {
                    field: field.into_owned(),
                    op: op_token.to_owned(),
                });
            };

            let values = if !op.takes_value() {
                // Anything after `$null.` is noise and dropped.
                Vec::new()
            } else {
                let Some(val) = val else {
                    return Err(FilterError::MissingValue {
                        field: field.into_owned(),
                        op: op_token.to_owned(),
                    });
                };
                if op.takes_list() {
                    val.split(',').map(str::to_owned).collect()
                } else {
                    vec![val.to_owned()]
                }
            };

            clauses.push(Clause { field: field.into_owned(), op, values });
        }

        Ok(Self { clauses })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Renders the `WHERE` fragment with numbered placeholders, starting at
    /// `$first_placeholder`. Returns the empty string for the empty
    /// predicate, so callers can append unconditionally:
    ///
    /// ```text
    /// " WHERE publisher = $1 AND slug IN ($2, $3)"
    /// ```
    pub fn where_sql(&self, first_placeholder: usize) -> String {
        self.where_sql_cast(first_placeholder, |_| None)
    }

    /// Like [`where_sql`](Self::where_sql), with a per-field SQL type each
    /// bound value is cast to (`$1::timestamptz`). Stores whose parameters
    /// arrive as text use this to compare against typed columns.
    pub fn where_sql_cast<F>(&self, first_placeholder: usize, cast: F) -> String
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        if self.clauses.is_empty() {
            return String::new();
        }

        let mut sql = String::from(" WHERE ");
        let mut n = first_placeholder;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            sql.push_str(&clause.field);
            sql.push(' ');
            sql.push_str(clause.op.sql());
            let suffix = match cast(&clause.field) {
                Some(ty) => format!("::{ty}"),
                None => String::new(),
            };
            if clause.op.takes_list() {
                sql.push_str(" (");
                for (j, _) in clause.values.iter().enumerate() {
                    if j > 0 {
                        sql.push_str(", ");
                    }
                    let _ = write!(sql, "${n}{suffix}");
                    n += 1;
                }
                sql.push(')');
            } else if clause.op.takes_value() {
                let _ = write!(sql, " ${n}{suffix}");
                n += 1;
            }
        }
        sql
    }

    /// The bind values in placeholder order, matching
    /// [`where_sql`](Self::where_sql).
    pub fn binds(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().flat_map(|c| c.values.iter().map(String::as_str))
    }

    /// Evaluates the predicate against one record, for stores that hold rows
    /// in memory. `lookup` returns the record's value for a field, `None`
    /// meaning SQL NULL. Comparison against NULL is false for every operator
    /// except `null`, matching relational semantics. When both sides parse as
    /// numbers they compare numerically, otherwise lexicographically.
    pub fn matches<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.clauses.iter().all(|clause| {
            let actual = lookup(&clause.field);
            match clause.op {
                Op::Null => actual.is_none(),
                Op::NotNull => actual.is_some(),
                Op::In => actual.is_some_and(|v| clause.values.iter().any(|w| *w == v)),
                Op::Nin => actual.is_some_and(|v| clause.values.iter().all(|w| *w != v)),
                Op::Eq => actual.is_some_and(|v| compare(&v, &clause.values[0]).is_eq()),
                Op::Ne => actual.is_some_and(|v| !compare(&v, &clause.values[0]).is_eq()),
                Op::Gt => actual.is_some_and(|v| compare(&v, &clause.values[0]).is_gt()),
                Op::Gte => actual.is_some_and(|v| compare(&v, &clause.values[0]).is_ge()),
                Op::Lt => actual.is_some_and(|v| compare(&v, &clause.values[0]).is_lt()),
                Op::Lte => actual.is_some_and(|v| compare(&v, &clause.values[0]).is_le()),
            }
        })
    }
}

fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
