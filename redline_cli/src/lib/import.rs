//! Adopt existing schemas and privileges

use anyhow::{bail, Result};
use colored::Colorize;

use redline_core::{
    config::{ResourcesConfig, SchemaConfig},
    Connection, Resource,
};
use redline_redshift::{SchemaGroupPrivilegeId, SchemaGroupPrivilegeResource, SchemaResource};

use crate::{
    cmd::ImportTarget,
    state::{RecordedSchema, RecordedState},
};

/// Read the target, record it and return the resources entry that keeps
/// it as it is.
pub(crate) async fn import(
    conn: &mut dyn Connection,
    target: &ImportTarget,
    state: &mut RecordedState,
) -> Result<ResourcesConfig> {
    let mut snippet = ResourcesConfig::default();
    match target {
        ImportTarget::Schema { id } => {
            if state.schema(*id).is_some() {
                bail!("schema {id} is already managed");
            }
            let imported = SchemaResource::default().import(conn, id).await?;
            snippet.schemas.push(SchemaConfig {
                id: Some(imported.id),
                name: imported.name.to_owned(),
                owner: Some(imported.owner),
                quota: imported.quota,
                cascade_on_delete: false,
            });
            state.put_schema(RecordedSchema {
                state: imported,
                cascade_on_delete: false,
            });
        }
        ImportTarget::Privilege { id } => {
            let id: SchemaGroupPrivilegeId = id.parse()?;
            if state.privileges(id).is_some() {
                bail!("privileges {id} are already managed");
            }
            let imported = SchemaGroupPrivilegeResource.import(conn, &id).await?;
            if imported.privileges.is_empty() {
                bail!("group {} holds no privileges on schema {}", id.group_id, id.schema_id);
            }
            snippet.schema_group_privileges.push(imported.to_config());
            state.put_privileges(imported);
        }
    }
    Ok(snippet)
}

/// Tell the user what to add to their resources file.
pub(crate) fn print_snippet(snippet: &ResourcesConfig) -> Result<()> {
    println!("{}", "Imported. Add this to your resources file:".green());
    println!("{}", textwrap::indent(&snippet.to_yaml()?, "  "));
    Ok(())
}
