//! Apply planned changes

use std::path::Path;

use anyhow::{Context, Result};

use redline_core::{logging::info, Connection, Resource};
use redline_redshift::{SchemaGroupPrivilegeResource, SchemaResource};

use crate::{
    plan::Change,
    state::{RecordedSchema, RecordedState},
};

/// Run the changes in order. The state file is rewritten after every
/// change that succeeds, so a failure part-way keeps what was done.
pub(crate) async fn apply_changes(
    conn: &mut dyn Connection,
    changes: &[Change],
    state: &mut RecordedState,
    state_path: &Path,
) -> Result<()> {
    for (i, change) in changes.iter().enumerate() {
        info!("applying change {} of {}", i + 1, changes.len());
        apply_change(conn, change, state)
            .await
            .with_context(|| format!("failed to apply:\n{change}"))?;
        state.save(state_path).await?;
    }
    Ok(())
}

async fn apply_change(
    conn: &mut dyn Connection,
    change: &Change,
    state: &mut RecordedState,
) -> Result<()> {
    match change {
        Change::CreateSchema(desired) => {
            let (_, created) = SchemaResource::new(desired).create(conn, desired).await?;
            state.put_schema(RecordedSchema {
                state: created,
                cascade_on_delete: desired.cascade_on_delete,
            });
        }
        Change::UpdateSchema { previous, desired } => {
            let updated = SchemaResource::new(desired)
                .update(conn, &previous.state.id, &previous.state, desired)
                .await?;
            state.put_schema(RecordedSchema {
                state: updated,
                cascade_on_delete: desired.cascade_on_delete,
            });
        }
        Change::DropSchema(recorded) => {
            let resource = SchemaResource {
                cascade_on_delete: recorded.cascade_on_delete,
            };
            resource.delete(conn, &recorded.state.id).await?;
            state.remove_schema(recorded.state.id);
        }
        Change::GrantPrivileges(desired) => {
            let (_, created) = SchemaGroupPrivilegeResource.create(conn, desired).await?;
            state.put_privileges(created);
        }
        Change::UpdatePrivileges { previous, desired } => {
            let updated = SchemaGroupPrivilegeResource
                .update(conn, &previous.id(), previous, desired)
                .await?;
            state.put_privileges(updated);
        }
        Change::RevokePrivileges(previous) => {
            SchemaGroupPrivilegeResource
                .delete(conn, &previous.id())
                .await?;
            state.remove_privileges(previous.id());
        }
    }
    Ok(())
}
