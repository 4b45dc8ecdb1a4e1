//! Managed resources and their lifecycle hooks.

mod schema;
mod schema_group_privilege;

pub use schema::SchemaResource;
pub use schema_group_privilege::{
    SchemaGroupPrivilegeId, SchemaGroupPrivilegeResource, SchemaGroupPrivilegeState,
};
