//! Connection and resource configuration.
//!
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::privileges::PrivilegeSet;

/// Default Redshift port.
pub const DEFAULT_PORT: u16 = 5439;
/// Env var consulted when the config file doesn't carry a password.
pub const PASSWORD_ENV_VAR: &str = "REDSHIFT_PASSWORD";

/// How to reach the warehouse. Lives in `redline.yaml` by default.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Cluster endpoint
    pub host: String,
    /// Cluster port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database to connect to. Schemas are database-scoped.
    pub database: String,
    /// User to connect as. Must be allowed to grant on the managed schemas.
    pub user: String,
    /// Falls back to the `REDSHIFT_PASSWORD` env var when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Connect timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionConfig {
    /// Read and validate the connection config.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let config = first_document::<ConnectionConfig>(&raw).context("deserializing config")?;
        config.validate()?;
        Ok(config)
    }

    /// Perform simple field validation to catch bad input.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("host", self.host.is_empty()),
            ("database", self.database.is_empty()),
            ("user", self.user.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!("connection config missing required fields: {missing:?}");
        }
        Ok(())
    }

    /// The configured password, or the one from the environment.
    pub fn password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV_VAR).ok())
    }
}

/// A schema as declared in the resources file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Oid of an adopted schema. Without it the schema is tracked by name
    /// and can't be renamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Schema name
    pub name: String,
    /// Owner user id. Defaults to the connecting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    /// Disk quota in megabytes. 0 means unlimited.
    #[serde(default)]
    pub quota: i64,
    /// Drop contained objects on delete.
    #[serde(default)]
    pub cascade_on_delete: bool,
}

/// A group's privileges on a schema as declared in the resources file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaGroupPrivilegeConfig {
    /// `pg_namespace.oid` of the schema
    pub schema_id: i64,
    /// `pg_group.grosysid` of the group
    pub group_id: i64,
    /// SELECT on tables
    #[serde(default)]
    pub select: bool,
    /// INSERT on tables
    #[serde(default)]
    pub insert: bool,
    /// UPDATE on tables
    #[serde(default)]
    pub update: bool,
    /// DELETE on tables
    #[serde(default)]
    pub delete: bool,
    /// REFERENCES on tables
    #[serde(default)]
    pub references: bool,
    /// USAGE on the schema
    #[serde(default)]
    pub usage: bool,
    /// CREATE on the schema
    #[serde(default)]
    pub create: bool,
}

impl SchemaGroupPrivilegeConfig {
    /// Build a config entry from ids and flags.
    pub fn new(schema_id: i64, group_id: i64, privileges: PrivilegeSet) -> Self {
        let PrivilegeSet {
            select,
            insert,
            update,
            delete,
            references,
            usage,
            create,
        } = privileges;
        Self {
            schema_id,
            group_id,
            select,
            insert,
            update,
            delete,
            references,
            usage,
            create,
        }
    }

    /// The desired flags.
    pub fn privileges(&self) -> PrivilegeSet {
        PrivilegeSet {
            select: self.select,
            insert: self.insert,
            update: self.update,
            delete: self.delete,
            references: self.references,
            usage: self.usage,
            create: self.create,
        }
    }
}

/// Everything redline should manage. Lives in `resources.yaml` by default.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcesConfig {
    /// Managed schemas
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
    /// Managed schema/group privilege associations
    #[serde(default)]
    pub schema_group_privileges: Vec<SchemaGroupPrivilegeConfig>,
}

impl ResourcesConfig {
    /// Read and validate the resources file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate resources from yaml text.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config = first_document::<ResourcesConfig>(raw).context("deserializing resources")?;
        config.validate()?;
        Ok(config)
    }

    /// Catch duplicates before anything talks to the warehouse.
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        let mut ids = std::collections::HashSet::new();
        for schema in &self.schemas {
            if let Some(id) = schema.id {
                if !ids.insert(id) {
                    bail!("schema id {id} is declared more than once");
                }
            }
            if schema.name.is_empty() {
                bail!("schema name can't be empty");
            }
            if !names.insert(&schema.name) {
                bail!("schema {} is declared more than once", schema.name);
            }
            if schema.quota < 0 {
                bail!("schema {} has a negative quota", schema.name);
            }
        }
        let mut pairs = std::collections::HashSet::new();
        for privilege in &self.schema_group_privileges {
            if !pairs.insert((privilege.schema_id, privilege.group_id)) {
                bail!(
                    "privileges for schema {} and group {} are declared more than once",
                    privilege.schema_id,
                    privilege.group_id
                );
            }
        }
        Ok(())
    }

    /// Convert this config to a yaml string.
    pub fn to_yaml(&self) -> Result<String> {
        yaml::to_string(self).map_err(anyhow::Error::from)
    }
}

fn first_document<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    let mut docs = yaml::from_str::<T>(raw)?;
    if docs.is_empty() {
        return Err(anyhow!["empty document"]);
    }
    Ok(docs.swap_remove(0))
}
