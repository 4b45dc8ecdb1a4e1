use serde::{Deserialize, Serialize};

use crate::consts::SYSTEM_SCHEMA_OWNER;

/// A `pg_namespace` row, resolved from its oid.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SchemaInfo {
    /// `oid`
    pub id: i64,
    /// The schema name. Can be renamed out-of-band, so it is re-read
    /// before every statement-building pass.
    pub name: String,
    /// `nspowner`
    pub owner: i64,
}

impl SchemaInfo {
    /// Catalog-internal schemas are owned by the bootstrap superuser.
    pub fn is_system(&self) -> bool {
        self.owner == SYSTEM_SCHEMA_OWNER
    }
}

/// Observed state of a managed schema.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SchemaState {
    /// `oid`
    pub id: i64,
    /// Current name
    pub name: String,
    /// Owner user id
    pub owner: i64,
    /// Quota in megabytes, 0 when unlimited.
    pub quota: i64,
}
