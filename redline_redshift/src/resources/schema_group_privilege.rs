use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use redline_core::{
    config::SchemaGroupPrivilegeConfig,
    diff::{diff, validate_desired},
    error::{Error, Result},
    logging::info,
    privileges::PrivilegeSet,
    Connection, Resource,
};
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::entry_types::{GroupInfo, SchemaInfo};
use crate::executor::{validate, Phase, TransactionExecutor};
use crate::write::privileges as statements;

/// Identifies a group's privileges on a schema. Rendered as
/// `"<schema_id>_<group_id>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaGroupPrivilegeId {
    /// `pg_namespace.oid`
    pub schema_id: i64,
    /// `pg_group.grosysid`
    pub group_id: i64,
}

impl Display for SchemaGroupPrivilegeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.schema_id, self.group_id)
    }
}

impl FromStr for SchemaGroupPrivilegeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidId(s.to_owned());
        let (schema, group) = s.split_once('_').ok_or_else(invalid)?;
        Ok(Self {
            schema_id: schema.parse().map_err(|_| invalid())?,
            group_id: group.parse().map_err(|_| invalid())?,
        })
    }
}

/// What the catalog says the group holds on the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaGroupPrivilegeState {
    /// `pg_namespace.oid`
    pub schema_id: i64,
    /// `pg_group.grosysid`
    pub group_id: i64,
    /// Current flags
    pub privileges: PrivilegeSet,
}

impl SchemaGroupPrivilegeState {
    /// The id of the association this state belongs to.
    pub fn id(&self) -> SchemaGroupPrivilegeId {
        SchemaGroupPrivilegeId {
            schema_id: self.schema_id,
            group_id: self.group_id,
        }
    }

    /// The config entry that would reproduce this state.
    pub fn to_config(&self) -> SchemaGroupPrivilegeConfig {
        SchemaGroupPrivilegeConfig::new(self.schema_id, self.group_id, self.privileges)
    }
}

/// A group's table and schema privileges on one schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaGroupPrivilegeResource;

#[async_trait]
impl Resource for SchemaGroupPrivilegeResource {
    type Id = SchemaGroupPrivilegeId;
    type Desired = SchemaGroupPrivilegeConfig;
    type State = SchemaGroupPrivilegeState;

    async fn create(
        &self,
        conn: &mut dyn Connection,
        desired: &SchemaGroupPrivilegeConfig,
    ) -> Result<(SchemaGroupPrivilegeId, SchemaGroupPrivilegeState)> {
        let privileges = validate(|| {
            let privileges = desired.privileges();
            validate_desired(&privileges)?;
            Ok(privileges)
        })?;
        let id = SchemaGroupPrivilegeId {
            schema_id: desired.schema_id,
            group_id: desired.group_id,
        };

        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = reconcile(&mut exec, id, None, &privileges).await;
        let state = exec.finish(outcome).await?;
        info!("granted [{}] for {}", state.privileges, id);
        Ok((id, state))
    }

    async fn read(
        &self,
        conn: &mut dyn Connection,
        id: &SchemaGroupPrivilegeId,
    ) -> Result<SchemaGroupPrivilegeState> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = read_state(&mut exec, *id).await;
        exec.finish(outcome).await
    }

    async fn update(
        &self,
        conn: &mut dyn Connection,
        id: &SchemaGroupPrivilegeId,
        previous: &SchemaGroupPrivilegeState,
        desired: &SchemaGroupPrivilegeConfig,
    ) -> Result<SchemaGroupPrivilegeState> {
        let privileges = validate(|| {
            if desired.schema_id != id.schema_id || desired.group_id != id.group_id {
                return Err(Error::validation(format!(
                    "schema_id and group_id can't change in place ({} -> {}_{})",
                    id, desired.schema_id, desired.group_id
                )));
            }
            let privileges = desired.privileges();
            validate_desired(&privileges)?;
            Ok(privileges)
        })?;

        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = reconcile(&mut exec, *id, Some(&previous.privileges), &privileges).await;
        let state = exec.finish(outcome).await?;
        info!("updated {} to [{}]", id, state.privileges);
        Ok(state)
    }

    async fn delete(&self, conn: &mut dyn Connection, id: &SchemaGroupPrivilegeId) -> Result<()> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = async {
            let (schema, group) = resolve(&mut exec, *id).await?;
            exec.execute_all(&statements::delete_statements(&schema.name, &group.name))
                .await
        }
        .await;
        exec.finish(outcome).await?;
        info!("revoked all privileges for {}", id);
        Ok(())
    }

    async fn exists(&self, conn: &mut dyn Connection, id: &SchemaGroupPrivilegeId) -> Result<bool> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = catalog::privilege_exists(exec.tx(), id.schema_id, id.group_id).await;
        exec.finish(outcome).await
    }
}

async fn resolve(
    exec: &mut TransactionExecutor<'_>,
    id: SchemaGroupPrivilegeId,
) -> Result<(SchemaInfo, GroupInfo)> {
    let schema = catalog::schema_info(exec.tx(), id.schema_id).await?;
    let group = catalog::group_info(exec.tx(), id.group_id).await?;
    Ok((schema, group))
}

async fn read_state(
    exec: &mut TransactionExecutor<'_>,
    id: SchemaGroupPrivilegeId,
) -> Result<SchemaGroupPrivilegeState> {
    let (schema, group) = resolve(exec, id).await?;
    exec.enter(Phase::ReadingBack);
    let privileges = catalog::read_privileges(exec.tx(), &schema, &group).await?;
    Ok(SchemaGroupPrivilegeState {
        schema_id: id.schema_id,
        group_id: id.group_id,
        privileges,
    })
}

/// Resolve names, diff, run the statements and read back, all inside the
/// executor's transaction.
async fn reconcile(
    exec: &mut TransactionExecutor<'_>,
    id: SchemaGroupPrivilegeId,
    previous: Option<&PrivilegeSet>,
    desired: &PrivilegeSet,
) -> Result<SchemaGroupPrivilegeState> {
    let (schema, group) = resolve(exec, id).await?;
    if schema.is_system() {
        return Err(Error::validation(format!(
            "cannot manage privileges on system schema {}",
            schema.name
        )));
    }

    exec.enter(Phase::Diffing);
    let changes = diff(previous, desired);
    let sql = match previous {
        None => statements::create_statements(&schema.name, &group.name, &changes)?,
        Some(_) => statements::update_statements(&schema.name, &group.name, &changes),
    };
    exec.execute_all(&sql).await?;

    exec.enter(Phase::ReadingBack);
    let privileges = catalog::read_privileges(exec.tx(), &schema, &group).await?;
    Ok(SchemaGroupPrivilegeState {
        schema_id: id.schema_id,
        group_id: id.group_id,
        privileges,
    })
}
