//! Store contract for reference-data resolution.
//!
//! The engine never builds SQL. It submits structured parameter rows to
//! operations identified by logical name ([`StoreOp`]); the backing store
//! owns the SQL text behind each name and expands variable-length
//! placeholder clauses (IN-lists, OR-combined predicates) from the number
//! of rows submitted.

use std::collections::HashMap;

use thiserror::Error;

pub mod sqlite;
pub mod templates;

pub use sqlite::{JobRow, Repository, SqliteStore};
pub use templates::StoreOp;

/// A single parameter bound into a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    Int(i64),
}

/// One row of parameters for a bulk operation, or one instance of a fetch
/// template's compound predicate.
pub type ParamRow = Vec<Arg>;

/// A row returned by a reference fetch: the surrogate id plus the
/// template's non-id columns, as text, in the template's declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRow {
    pub id: i64,
    pub cols: Vec<String>,
}

impl FetchedRow {
    /// Text column at `idx`, counting from the first non-id column.
    pub fn col(&self, idx: usize) -> Result<&str, StoreError> {
        self.cols
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| StoreError::MalformedRow {
                detail: format!("missing column {} (row has {})", idx, self.cols.len()),
            })
    }
}

/// Store failures. Any of these aborts the current flush; the engine never
/// retries on its own.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A statement failed to prepare or execute.
    #[error("sql operation failed: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A fetch produced a row the caller could not interpret.
    #[error("malformed row from store: {detail}")]
    MalformedRow { detail: String },

    /// An operation was routed through the wrong store call for its
    /// template shape.
    #[error("operation {op} misused: {detail}")]
    TemplateMisuse { op: &'static str, detail: String },
}

/// Contract between the resolution engine and a backing relational store.
///
/// Create operations must behave as insert-or-skip against the natural
/// unique key, so concurrent sessions racing to create the same fact leave
/// exactly one surviving row. Fetches issued after a create within the same
/// flush must observe that create: implementations backed by replicated
/// engines must route them through the primary write path.
pub trait RefDataStore {
    /// Execute an insert-with-conflict-ignore operation once per row.
    /// Returns the number of rows actually created (conflicts count zero).
    fn bulk_create_or_ignore(&self, op: StoreOp, rows: &[ParamRow]) -> Result<usize, StoreError>;

    /// Execute an update operation once per row, in row order. Returns the
    /// number of rows affected.
    fn bulk_update(&self, op: StoreOp, rows: &[ParamRow]) -> Result<usize, StoreError>;

    /// Select rows matching any one of the predicate instances. Each param
    /// row binds one instance of the template's compound predicate; the
    /// instances are OR-combined.
    fn fetch_by_predicate(
        &self,
        op: StoreOp,
        predicates: &[ParamRow],
    ) -> Result<Vec<FetchedRow>, StoreError>;

    /// Select rows whose `key_column` value is in `values`, keyed by that
    /// column.
    fn fetch_by_in_list(
        &self,
        op: StoreOp,
        values: &[Arg],
        key_column: &str,
    ) -> Result<HashMap<String, FetchedRow>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_row_col_bounds() {
        let row = FetchedRow {
            id: 1,
            cols: vec!["linux".to_string()],
        };
        assert_eq!(row.col(0).unwrap(), "linux");
        assert!(matches!(row.col(1), Err(StoreError::MalformedRow { .. })));
    }
}
