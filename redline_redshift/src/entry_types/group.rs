use serde::{Deserialize, Serialize};

/// A `pg_group` row, resolved from its id.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    /// `grosysid`
    pub id: i64,
    /// The group name. Mutable, so never cached across operations.
    pub name: String,
}
