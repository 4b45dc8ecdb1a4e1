use async_trait::async_trait;
use redline_core::{
    config::SchemaConfig,
    error::{CatalogKind, Error, Result},
    logging::info,
    Connection, Resource,
};

use crate::catalog;
use crate::consts::SYSTEM_SCHEMA_OWNER;
use crate::entry_types::SchemaState;
use crate::executor::{validate, Phase, TransactionExecutor};
use crate::write::schemas as statements;

/// A schema, identified by its oid.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaResource {
    /// Drop contained objects along with the schema.
    pub cascade_on_delete: bool,
}

impl SchemaResource {
    /// Resource for a configured schema.
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            cascade_on_delete: config.cascade_on_delete,
        }
    }
}

fn check_desired(desired: &SchemaConfig) -> Result<()> {
    if desired.name.is_empty() {
        return Err(Error::validation("schema name can't be empty"));
    }
    if desired.quota < 0 {
        return Err(Error::validation(format!(
            "schema {} has a negative quota",
            desired.name
        )));
    }
    Ok(())
}

fn check_not_system(state: &SchemaState) -> Result<()> {
    if state.owner == SYSTEM_SCHEMA_OWNER {
        Err(Error::validation(format!(
            "cannot manage system schema {}",
            state.name
        )))
    } else {
        Ok(())
    }
}

async fn current_state(exec: &mut TransactionExecutor<'_>, id: i64) -> Result<SchemaState> {
    catalog::schema_state(exec.tx(), id)
        .await?
        .ok_or_else(|| Error::lookup(CatalogKind::Schema, id))
}

#[async_trait]
impl Resource for SchemaResource {
    type Id = i64;
    type Desired = SchemaConfig;
    type State = SchemaState;

    async fn create(
        &self,
        conn: &mut dyn Connection,
        desired: &SchemaConfig,
    ) -> Result<(i64, SchemaState)> {
        validate(|| check_desired(desired))?;

        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = async {
            let owner = match desired.owner {
                Some(id) => Some(catalog::user_name(exec.tx(), id).await?),
                None => None,
            };
            exec.enter(Phase::Diffing);
            let sql = statements::create_schema(&desired.name, owner.as_deref(), desired.quota);
            exec.execute_all(&[sql]).await?;

            exec.enter(Phase::ReadingBack);
            let id = catalog::schema_oid(exec.tx(), &desired.name).await?;
            current_state(&mut exec, id).await
        }
        .await;
        let state = exec.finish(outcome).await?;
        info!("created schema {} ({})", state.name, state.id);
        Ok((state.id, state))
    }

    async fn read(&self, conn: &mut dyn Connection, id: &i64) -> Result<SchemaState> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = current_state(&mut exec, *id).await;
        exec.finish(outcome).await
    }

    /// Rename, change owner and change quota, each only when the desired
    /// value differs from the live one. The recorded state is ignored.
    async fn update(
        &self,
        conn: &mut dyn Connection,
        id: &i64,
        _previous: &SchemaState,
        desired: &SchemaConfig,
    ) -> Result<SchemaState> {
        validate(|| check_desired(desired))?;

        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = async {
            let current = current_state(&mut exec, *id).await?;
            check_not_system(&current)?;
            let owner = match desired.owner {
                Some(owner) if owner != current.owner => {
                    Some(catalog::user_name(exec.tx(), owner).await?)
                }
                _ => None,
            };

            exec.enter(Phase::Diffing);
            let mut sql = vec![];
            let mut name = current.name.as_str();
            if desired.name != current.name {
                sql.push(statements::rename_schema(name, &desired.name));
                name = &desired.name;
            }
            if let Some(owner) = &owner {
                sql.push(statements::alter_schema_owner(name, owner));
            }
            if desired.quota != current.quota {
                sql.push(statements::alter_schema_quota(name, desired.quota));
            }
            exec.execute_all(&sql).await?;

            exec.enter(Phase::ReadingBack);
            current_state(&mut exec, *id).await
        }
        .await;
        let state = exec.finish(outcome).await?;
        info!("updated schema {} ({})", state.name, state.id);
        Ok(state)
    }

    async fn delete(&self, conn: &mut dyn Connection, id: &i64) -> Result<()> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = async {
            let current = current_state(&mut exec, *id).await?;
            check_not_system(&current)?;
            exec.execute_all(&[statements::drop_schema(
                &current.name,
                self.cascade_on_delete,
            )])
            .await?;
            Ok::<_, Error>(current.name)
        }
        .await;
        let name = exec.finish(outcome).await?;
        info!("dropped schema {} ({})", name, id);
        Ok(())
    }

    async fn exists(&self, conn: &mut dyn Connection, id: &i64) -> Result<bool> {
        let mut exec = TransactionExecutor::begin(conn).await?;
        let outcome = catalog::schema_state(exec.tx(), *id).await;
        exec.finish(outcome).await.map(|s| s.is_some())
    }
}
