//! Read-only catalog access.
//!
//! Nothing is cached here. Every call goes to the warehouse, which is the
//! system of record, and names are always re-resolved from ids.

use redline_core::{
    acl::{self, AclEntry},
    connection::{query_error, ColumnError, TransactionExt},
    error::{CatalogKind, Error, Result},
    logging::debug,
    privileges::{PrivilegeScope, PrivilegeSet},
    SqlValue, Transaction,
};

use crate::consts;
use crate::entry_types::{GroupInfo, SchemaInfo, SchemaState};

/// Resolve a schema's name and owner from its oid.
pub async fn schema_info(tx: &mut (dyn Transaction + '_), schema_id: i64) -> Result<SchemaInfo> {
    let row = tx
        .fetch_row(consts::SCHEMA_INFO, &[SqlValue::Int(schema_id)])
        .await?
        .ok_or_else(|| Error::lookup(CatalogKind::Schema, schema_id))?;
    let column = |e: ColumnError| query_error(consts::SCHEMA_INFO, Box::new(e));
    Ok(SchemaInfo {
        id: schema_id,
        name: row.text(0).map_err(column)?.to_owned(),
        owner: row.int(1).map_err(column)?,
    })
}

/// Resolve a group's name from its id.
pub async fn group_info(tx: &mut (dyn Transaction + '_), group_id: i64) -> Result<GroupInfo> {
    let name = tx
        .lookup_name(consts::GROUP_NAME, CatalogKind::Group, group_id)
        .await?;
    Ok(GroupInfo { id: group_id, name })
}

/// Resolve a user's name from its id.
pub async fn user_name(tx: &mut (dyn Transaction + '_), user_id: i64) -> Result<String> {
    tx.lookup_name(consts::USER_NAME, CatalogKind::User, user_id)
        .await
}

/// Find a schema's oid by its exact name.
pub async fn schema_oid(tx: &mut (dyn Transaction + '_), name: &str) -> Result<i64> {
    let row = tx
        .fetch_row(consts::SCHEMA_OID_BY_NAME, &[SqlValue::from(name)])
        .await?
        .ok_or_else(|| Error::lookup(CatalogKind::Schema, name))?;
    row.int(0)
        .map_err(|e| query_error(consts::SCHEMA_OID_BY_NAME, Box::new(e)))
}

/// Name, owner and quota of a schema. `None` when the oid is gone.
pub async fn schema_state(
    tx: &mut (dyn Transaction + '_),
    schema_id: i64,
) -> Result<Option<SchemaState>> {
    let Some(row) = tx
        .fetch_row(consts::SCHEMA_STATE, &[SqlValue::Int(schema_id)])
        .await?
    else {
        return Ok(None);
    };
    let column = |e: ColumnError| query_error(consts::SCHEMA_STATE, Box::new(e));
    Ok(Some(SchemaState {
        id: schema_id,
        name: row.text(0).map_err(column)?.to_owned(),
        owner: row.int(1).map_err(column)?,
        quota: row.int(2).map_err(column)?,
    }))
}

/// Decoded `nspacl` of the schema. Empty when the schema has no ACL.
pub async fn schema_acl(tx: &mut (dyn Transaction + '_), schema_id: i64) -> Result<Vec<AclEntry>> {
    let rows = tx
        .fetch_all(consts::SCHEMA_ACL, &[SqlValue::Int(schema_id)])
        .await?;
    decode_rows(consts::SCHEMA_ACL, &rows)
}

/// Decoded table default-privilege entries of the schema, across every
/// `pg_default_acl` row.
pub async fn default_table_acl(
    tx: &mut (dyn Transaction + '_),
    schema_id: i64,
) -> Result<Vec<AclEntry>> {
    let rows = tx
        .fetch_all(consts::DEFAULT_TABLE_ACL, &[SqlValue::Int(schema_id)])
        .await?;
    decode_rows(consts::DEFAULT_TABLE_ACL, &rows)
}

fn decode_rows(query: &str, rows: &[redline_core::Row]) -> Result<Vec<AclEntry>> {
    let mut res = vec![];
    for row in rows {
        let text = row
            .opt_text(0)
            .map_err(|e| query_error(query, Box::new(e)))?;
        res.extend(acl::parse_acl(text).map_err(|e| query_error(query, Box::new(e)))?);
    }
    Ok(res)
}

/// The group's current flags on the schema.
///
/// Table flags come from the schema's table default privileges, schema
/// flags from the schema ACL. A group that appears nowhere has every flag
/// false; that isn't an error.
pub async fn read_privileges(
    tx: &mut (dyn Transaction + '_),
    schema: &SchemaInfo,
    group: &GroupInfo,
) -> Result<PrivilegeSet> {
    let table = acl::group_privileges(
        &default_table_acl(tx, schema.id).await?,
        &group.name,
        PrivilegeScope::Table,
    );
    let on_schema = acl::group_privileges(
        &schema_acl(tx, schema.id).await?,
        &group.name,
        PrivilegeScope::Schema,
    );
    let mut res = table;
    res.usage = on_schema.usage;
    res.create = on_schema.create;
    debug!(
        "group {} holds [{}] on schema {}",
        group.name, res, schema.name
    );
    Ok(res)
}

/// Whether the group shows up in either ACL of the schema. Ids that don't
/// resolve mean the association is gone.
pub async fn privilege_exists(
    tx: &mut (dyn Transaction + '_),
    schema_id: i64,
    group_id: i64,
) -> Result<bool> {
    let group = match group_info(tx, group_id).await {
        Ok(group) => group,
        Err(Error::CatalogLookup { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };
    match schema_info(tx, schema_id).await {
        Ok(_) => (),
        Err(Error::CatalogLookup { .. }) => return Ok(false),
        Err(e) => return Err(e),
    };
    let in_defaults = default_table_acl(tx, schema_id)
        .await?
        .iter()
        .any(|e| e.is_for_group(&group.name));
    if in_defaults {
        return Ok(true);
    }
    Ok(schema_acl(tx, schema_id)
        .await?
        .iter()
        .any(|e| e.is_for_group(&group.name)))
}
