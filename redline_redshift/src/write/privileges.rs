//! managing the write path for schema/group privileges

use redline_core::{
    diff::PrivilegeChange,
    error::{Error, Result},
    privileges::{Privilege, PrivilegeScope},
};

use super::quote_ident;

/// Statements for a brand-new association.
///
/// Every change must be a grant. Table privileges are batched into one
/// GRANT on the existing tables plus one matching default-privilege rule;
/// schema privileges get one GRANT each.
pub fn create_statements(
    schema: &str,
    group: &str,
    changes: &[PrivilegeChange],
) -> Result<Vec<String>> {
    if changes.is_empty() {
        return Err(Error::validation("no privileges to grant"));
    }
    if changes.iter().any(|c| !c.grant) {
        return Err(Error::validation(
            "a new privilege association can only grant",
        ));
    }
    let (schema, group) = (quote_ident(schema), quote_ident(group));
    let (table, on_schema): (Vec<_>, Vec<_>) = changes
        .iter()
        .map(|c| c.privilege)
        .partition(|p| p.scope() == PrivilegeScope::Table);

    let mut res = vec![];
    if !table.is_empty() {
        let privileges = keywords(&table);
        res.push(format!(
            "GRANT {privileges} ON ALL TABLES IN SCHEMA {schema} TO GROUP {group}"
        ));
        res.push(format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} GRANT {privileges} ON TABLES TO GROUP {group}"
        ));
    }
    for privilege in on_schema {
        res.push(format!("GRANT {privilege} ON SCHEMA {schema} TO GROUP {group}"));
    }
    Ok(res)
}

/// Statements for an existing association, one set per changed flag.
pub fn update_statements(schema: &str, group: &str, changes: &[PrivilegeChange]) -> Vec<String> {
    let (schema, group) = (quote_ident(schema), quote_ident(group));
    changes
        .iter()
        .flat_map(|change| change_statements(&schema, &group, change))
        .collect()
}

fn change_statements(schema: &str, group: &str, change: &PrivilegeChange) -> Vec<String> {
    let privilege = change.privilege;
    match (privilege.scope(), change.grant) {
        (PrivilegeScope::Table, true) => vec![
            format!("GRANT {privilege} ON ALL TABLES IN SCHEMA {schema} TO GROUP {group}"),
            format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} GRANT {privilege} ON TABLES TO GROUP {group}"
            ),
        ],
        (PrivilegeScope::Table, false) => vec![
            format!("REVOKE {privilege} ON ALL TABLES IN SCHEMA {schema} FROM GROUP {group}"),
            format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} REVOKE {privilege} ON TABLES FROM GROUP {group}"
            ),
        ],
        (PrivilegeScope::Schema, true) => {
            vec![format!("GRANT {privilege} ON SCHEMA {schema} TO GROUP {group}")]
        }
        (PrivilegeScope::Schema, false) => {
            vec![format!("REVOKE {privilege} ON SCHEMA {schema} FROM GROUP {group}")]
        }
    }
}

/// Statements that remove every privilege the group holds on the schema.
pub fn delete_statements(schema: &str, group: &str) -> Vec<String> {
    let (schema, group) = (quote_ident(schema), quote_ident(group));
    vec![
        format!("REVOKE ALL ON ALL TABLES IN SCHEMA {schema} FROM GROUP {group}"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA {schema} REVOKE ALL ON TABLES FROM GROUP {group}"),
        format!("REVOKE ALL ON SCHEMA {schema} FROM GROUP {group}"),
    ]
}

fn keywords(privileges: &[Privilege]) -> String {
    privileges
        .iter()
        .map(|p| p.keyword())
        .collect::<Vec<_>>()
        .join(",")
}
