//! Errors surfaced by reconciliation.
//!
//! Nothing here is retried. Every variant is a terminal result for the
//! invocation that produced it.

use thiserror::Error;

/// Boxed driver error carried as the source of warehouse failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the library crates.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The kind of catalog object an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// A `pg_namespace` row.
    Schema,
    /// A `pg_group` row.
    Group,
    /// A `pg_user` row.
    User,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Schema => write!(f, "schema"),
            CatalogKind::Group => write!(f, "group"),
            CatalogKind::User => write!(f, "user"),
        }
    }
}

/// Everything that can go wrong while reading or reconciling state.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was rejected before any statement ran.
    #[error("{0}")]
    Validation(String),
    /// A schema, group or user id did not resolve to a name.
    #[error("no {kind} found with id {id}")]
    CatalogLookup {
        /// What was being looked up.
        kind: CatalogKind,
        /// The id that didn't resolve.
        id: String,
    },
    /// A read-only catalog query failed.
    #[error("catalog query failed: {query}")]
    Query {
        /// The query text.
        query: String,
        /// The driver error.
        #[source]
        source: BoxError,
    },
    /// A write statement failed. The transaction was rolled back.
    #[error("statement failed: {statement}")]
    Execution {
        /// The statement text.
        statement: String,
        /// The driver error.
        #[source]
        source: BoxError,
    },
    /// Opening the transaction failed.
    #[error("unable to begin transaction")]
    Begin(#[source] BoxError),
    /// Committing the transaction failed.
    #[error("unable to commit transaction")]
    Commit(#[source] BoxError),
    /// The connection couldn't be established.
    #[error("unable to connect to the warehouse")]
    Connection(#[source] BoxError),
    /// A resource id couldn't be parsed.
    #[error("invalid resource id: {0}")]
    InvalidId(String),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for a lookup miss.
    pub fn lookup(kind: CatalogKind, id: impl ToString) -> Self {
        Error::CatalogLookup {
            kind,
            id: id.to_string(),
        }
    }

    /// True for failures that were rejected before touching the warehouse.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
