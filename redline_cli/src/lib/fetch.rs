//! Re-read recorded resources from the cluster

use anyhow::{Context, Result};

use redline_core::{logging::warn, Connection, Resource};
use redline_redshift::{SchemaGroupPrivilegeResource, SchemaResource};

use crate::state::{RecordedSchema, RecordedState};

/// Observe every recorded resource again. Resources that are gone are
/// dropped from the returned state so the next plan recreates them.
pub(crate) async fn refresh(
    conn: &mut dyn Connection,
    recorded: &RecordedState,
) -> Result<RecordedState> {
    let mut res = RecordedState::default();

    for schema in &recorded.schemas {
        let resource = SchemaResource {
            cascade_on_delete: schema.cascade_on_delete,
        };
        let id = schema.state.id;
        if !resource.exists(conn, &id).await? {
            warn!(
                "schema {} ({}) no longer exists; removing it from state",
                schema.state.name, id
            );
            continue;
        }
        let state = resource
            .read(conn, &id)
            .await
            .with_context(|| format!("reading schema {id}"))?;
        res.put_schema(RecordedSchema {
            state,
            cascade_on_delete: schema.cascade_on_delete,
        });
    }

    for privileges in &recorded.schema_group_privileges {
        let id = privileges.id();
        if !SchemaGroupPrivilegeResource.exists(conn, &id).await? {
            warn!("privileges {id} were revoked outside redline; removing them from state");
            continue;
        }
        let state = SchemaGroupPrivilegeResource
            .read(conn, &id)
            .await
            .with_context(|| format!("reading privileges {id}"))?;
        res.put_privileges(state);
    }

    Ok(res)
}
