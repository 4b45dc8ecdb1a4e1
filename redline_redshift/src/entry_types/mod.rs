//! Rows resolved from the catalog.

mod group;
mod schema;

pub use group::GroupInfo;
pub use schema::{SchemaInfo, SchemaState};
