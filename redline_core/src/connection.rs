//! The warehouse SQL seam.
//!
//! Connectors implement [`Connection`] and [`Transaction`] over their driver.
//! Values cross the seam as [`SqlValue`] so reconciliation code and tests
//! never depend on a driver's row type.

use async_trait::async_trait;

use crate::error::{BoxError, CatalogKind, Error, Result};

/// A scalar crossing the seam, as a parameter or a column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// boolean
    Bool(bool),
    /// Any integer column, widened.
    Int(i64),
    /// Any text-like column.
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(pub Vec<SqlValue>);

/// A column that was missing or of the wrong type.
#[derive(Debug, thiserror::Error)]
#[error("column {index}: expected {expected}, found {found:?}")]
pub struct ColumnError {
    index: usize,
    expected: &'static str,
    found: Option<SqlValue>,
}

impl Row {
    /// Build a row from anything convertible to values.
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Row(values.into_iter().map(Into::into).collect())
    }

    fn column_error(&self, index: usize, expected: &'static str) -> ColumnError {
        ColumnError {
            index,
            expected,
            found: self.0.get(index).cloned(),
        }
    }

    /// A non-null integer column.
    pub fn int(&self, index: usize) -> Result<i64, ColumnError> {
        match self.0.get(index) {
            Some(SqlValue::Int(v)) => Ok(*v),
            _ => Err(self.column_error(index, "integer")),
        }
    }

    /// A non-null text column.
    pub fn text(&self, index: usize) -> Result<&str, ColumnError> {
        match self.0.get(index) {
            Some(SqlValue::Text(v)) => Ok(v),
            _ => Err(self.column_error(index, "text")),
        }
    }

    /// A nullable text column.
    pub fn opt_text(&self, index: usize) -> Result<Option<&str>, ColumnError> {
        match self.0.get(index) {
            Some(SqlValue::Text(v)) => Ok(Some(v)),
            Some(SqlValue::Null) => Ok(None),
            _ => Err(self.column_error(index, "nullable text")),
        }
    }
}

/// An open transaction. Every statement of one reconcile call goes through
/// the same transaction, in order.
#[async_trait]
pub trait Transaction: Send {
    /// Run a query expected to return at most one row.
    async fn query_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, BoxError>;
    /// Run a query and collect every row.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BoxError>;
    /// Run a statement, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError>;
    /// Make the transaction's writes durable.
    async fn commit(self: Box<Self>) -> Result<(), BoxError>;
    /// Discard the transaction's writes.
    async fn rollback(self: Box<Self>) -> Result<(), BoxError>;
}

/// A single warehouse connection.
#[async_trait]
pub trait Connection: Send {
    /// Open a transaction. Only one may be open at a time.
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, BoxError>;
}

/// Query helpers that attach the query text to failures.
#[async_trait]
pub trait TransactionExt: Transaction {
    /// [`Transaction::query_row`], mapping failures to [`Error::Query`].
    async fn fetch_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>> {
        self.query_row(sql, params)
            .await
            .map_err(|source| query_error(sql, source))
    }

    /// [`Transaction::query`], mapping failures to [`Error::Query`].
    async fn fetch_all(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.query(sql, params)
            .await
            .map_err(|source| query_error(sql, source))
    }

    /// Look up a single name by id, failing with [`Error::CatalogLookup`]
    /// when no row comes back.
    async fn lookup_name(&mut self, sql: &str, kind: CatalogKind, id: i64) -> Result<String> {
        let row = self
            .fetch_row(sql, &[SqlValue::Int(id)])
            .await?
            .ok_or_else(|| Error::lookup(kind, id))?;
        row.text(0)
            .map(str::to_owned)
            .map_err(|e| query_error(sql, e.into()))
    }
}

impl<T: Transaction + ?Sized> TransactionExt for T {}

/// Wrap a driver error for a read-only query.
pub fn query_error(sql: &str, source: BoxError) -> Error {
    Error::Query {
        query: sql.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let row = Row(vec![
            SqlValue::Text("analytics".to_owned()),
            SqlValue::Int(100),
            SqlValue::Null,
        ]);
        assert_eq!(row.text(0).unwrap(), "analytics");
        assert_eq!(row.int(1).unwrap(), 100);
        assert_eq!(row.opt_text(2).unwrap(), None);
        assert!(row.int(0).is_err());
        assert!(row.text(5).is_err());
    }
}
