//! plan the changes that take the recorded state to the configured one

use std::fmt::Display;

use anyhow::{bail, Result};
use colored::Colorize;

use redline_core::{
    config::{ResourcesConfig, SchemaConfig, SchemaGroupPrivilegeConfig},
    diff::diff,
};
use redline_redshift::SchemaGroupPrivilegeState;

use crate::state::{RecordedSchema, RecordedState};

/// One resource-level change. Applied in the order the plan lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    CreateSchema(SchemaConfig),
    UpdateSchema {
        previous: RecordedSchema,
        desired: SchemaConfig,
    },
    DropSchema(RecordedSchema),
    GrantPrivileges(SchemaGroupPrivilegeConfig),
    UpdatePrivileges {
        previous: SchemaGroupPrivilegeState,
        desired: SchemaGroupPrivilegeConfig,
    },
    RevokePrivileges(SchemaGroupPrivilegeState),
}

impl Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::CreateSchema(desired) => {
                let mut text = format!("+ schema {}", desired.name);
                if let Some(owner) = desired.owner {
                    text += &format!("\n  owner: {owner}");
                }
                if desired.quota > 0 {
                    text += &format!("\n  quota: {} MB", desired.quota);
                }
                write!(f, "{}", text.green())
            }
            Change::UpdateSchema { previous, desired } => {
                let cascade = previous.cascade_on_delete;
                let previous = &previous.state;
                let mut text = format!("~ schema {} ({})", previous.name, previous.id);
                if desired.name != previous.name {
                    text += &format!("\n  name: {} -> {}", previous.name, desired.name);
                }
                if let Some(owner) = desired.owner.filter(|o| *o != previous.owner) {
                    text += &format!("\n  owner: {} -> {owner}", previous.owner);
                }
                if desired.quota != previous.quota {
                    text += &format!("\n  quota: {} -> {}", previous.quota, desired.quota);
                }
                if desired.cascade_on_delete != cascade {
                    text += &format!(
                        "\n  cascade_on_delete: {cascade} -> {}",
                        desired.cascade_on_delete
                    );
                }
                write!(f, "{}", text.yellow())
            }
            Change::DropSchema(recorded) => {
                let cascade = if recorded.cascade_on_delete {
                    " (cascade)"
                } else {
                    ""
                };
                let text = format!(
                    "- schema {} ({}){cascade}",
                    recorded.state.name, recorded.state.id
                );
                write!(f, "{}", text.red())
            }
            Change::GrantPrivileges(desired) => {
                let text = format!(
                    "+ privileges {}_{}: {}",
                    desired.schema_id,
                    desired.group_id,
                    desired.privileges()
                );
                write!(f, "{}", text.green())
            }
            Change::UpdatePrivileges { previous, desired } => {
                let mut text = format!("~ privileges {}", previous.id());
                for change in diff(Some(&previous.privileges), &desired.privileges()) {
                    let sign = if change.grant { "+" } else { "-" };
                    text += &format!("\n  {sign} {}", change.privilege);
                }
                write!(f, "{}", text.yellow())
            }
            Change::RevokePrivileges(previous) => {
                let text = format!("- privileges {}: {}", previous.id(), previous.privileges);
                write!(f, "{}", text.red())
            }
        }
    }
}

/// Compare the configured resources with the recorded state.
///
/// Schemas with an `id` are matched to the recorded schema with that oid,
/// the others by name. Privileges are matched by schema and group id.
/// Creates and updates come first, then revokes, then drops.
pub(crate) fn plan_changes(desired: &ResourcesConfig, recorded: &RecordedState) -> Result<Vec<Change>> {
    let mut changes = vec![];
    let mut kept_schemas = vec![];

    for schema in &desired.schemas {
        let matched = match schema.id {
            Some(id) => match recorded.schema(id) {
                Some(r) => Some(r),
                None => bail!(
                    "schema {} has id {id}, which isn't managed yet. \
                    Adopt it with `redline import schema {id}`",
                    schema.name
                ),
            },
            None => recorded.schemas.iter().find(|r| r.state.name == schema.name),
        };
        match matched {
            Some(previous) => {
                kept_schemas.push(previous.state.id);
                let changed = previous.state.name != schema.name
                    || schema.owner.map_or(false, |o| o != previous.state.owner)
                    || schema.quota != previous.state.quota
                    || schema.cascade_on_delete != previous.cascade_on_delete;
                if changed {
                    changes.push(Change::UpdateSchema {
                        previous: previous.clone(),
                        desired: schema.clone(),
                    });
                }
            }
            None => changes.push(Change::CreateSchema(schema.clone())),
        }
    }

    let mut kept_privileges = vec![];
    for privileges in &desired.schema_group_privileges {
        let id = redline_redshift::SchemaGroupPrivilegeId {
            schema_id: privileges.schema_id,
            group_id: privileges.group_id,
        };
        match recorded.privileges(id) {
            Some(previous) => {
                kept_privileges.push(id);
                if !diff(Some(&previous.privileges), &privileges.privileges()).is_empty() {
                    changes.push(Change::UpdatePrivileges {
                        previous: *previous,
                        desired: privileges.clone(),
                    });
                }
            }
            None => changes.push(Change::GrantPrivileges(privileges.clone())),
        }
    }

    changes.extend(
        recorded
            .schema_group_privileges
            .iter()
            .filter(|p| !kept_privileges.contains(&p.id()))
            .map(|p| Change::RevokePrivileges(*p)),
    );
    changes.extend(
        recorded
            .schemas
            .iter()
            .filter(|s| !kept_schemas.contains(&s.state.id))
            .map(|s| Change::DropSchema(s.clone())),
    );
    Ok(changes)
}

/// Print a plan the way `plan` and `apply` show it.
pub(crate) fn print_plan(changes: &[Change]) {
    if changes.is_empty() {
        println!("No changes planned");
        return;
    }
    for change in changes {
        println!("{}\n", textwrap::indent(&change.to_string(), "  "));
    }
}
