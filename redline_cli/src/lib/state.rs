//! The state file: what redline created or adopted on previous runs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use redline_core::logging::debug;
use redline_redshift::{SchemaGroupPrivilegeId, SchemaGroupPrivilegeState, SchemaState};

/// A managed schema as last observed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedSchema {
    pub(crate) state: SchemaState,
    #[serde(default)]
    pub(crate) cascade_on_delete: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RecordedState {
    #[serde(default)]
    pub(crate) schemas: Vec<RecordedSchema>,
    #[serde(default)]
    pub(crate) schema_group_privileges: Vec<SchemaGroupPrivilegeState>,
}

impl RecordedState {
    /// Load the state file. A missing file is an empty state.
    pub(crate) async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no state at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub(crate) async fn save(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub(crate) fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn schema(&self, id: i64) -> Option<&RecordedSchema> {
        self.schemas.iter().find(|s| s.state.id == id)
    }

    pub(crate) fn privileges(&self, id: SchemaGroupPrivilegeId) -> Option<&SchemaGroupPrivilegeState> {
        self.schema_group_privileges.iter().find(|p| p.id() == id)
    }

    /// Insert or replace by oid.
    pub(crate) fn put_schema(&mut self, schema: RecordedSchema) {
        match self.schemas.iter_mut().find(|s| s.state.id == schema.state.id) {
            Some(existing) => *existing = schema,
            None => self.schemas.push(schema),
        }
    }

    pub(crate) fn remove_schema(&mut self, id: i64) {
        self.schemas.retain(|s| s.state.id != id);
    }

    /// Insert or replace by id.
    pub(crate) fn put_privileges(&mut self, state: SchemaGroupPrivilegeState) {
        match self
            .schema_group_privileges
            .iter_mut()
            .find(|p| p.id() == state.id())
        {
            Some(existing) => *existing = state,
            None => self.schema_group_privileges.push(state),
        }
    }

    pub(crate) fn remove_privileges(&mut self, id: SchemaGroupPrivilegeId) {
        self.schema_group_privileges.retain(|p| p.id() != id);
    }
}

#[cfg(test)]
mod tests {
    use redline_core::privileges::{Privilege, PrivilegeSet};

    use super::*;

    fn privileges(schema_id: i64, privileges: &[Privilege]) -> SchemaGroupPrivilegeState {
        SchemaGroupPrivilegeState {
            schema_id,
            group_id: 104,
            privileges: PrivilegeSet::from_privileges(privileges.iter().copied()),
        }
    }

    #[test]
    fn state_file_format() -> Result<()> {
        let state = RecordedState::from_json(
            r#"{
                "schemas": [
                    {"state": {"id": 1201, "name": "analytics", "owner": 100, "quota": 0}}
                ],
                "schema_group_privileges": [
                    {"schema_id": 1201, "group_id": 104, "privileges": {"select": true, "usage": true}}
                ]
            }"#,
        )?;
        assert!(!state.schemas[0].cascade_on_delete);
        assert_eq!(
            state.schema_group_privileges[0],
            privileges(1201, &[Privilege::Select, Privilege::Usage])
        );
        assert_eq!(RecordedState::from_json(&state.to_json()?)?, state);
        Ok(())
    }

    #[test]
    fn put_replaces_by_id() {
        let mut state = RecordedState::default();
        state.put_privileges(privileges(1201, &[Privilege::Select]));
        state.put_privileges(privileges(1202, &[Privilege::Usage]));
        state.put_privileges(privileges(1201, &[Privilege::Insert]));
        assert_eq!(state.schema_group_privileges.len(), 2);
        let id = SchemaGroupPrivilegeId {
            schema_id: 1201,
            group_id: 104,
        };
        assert_eq!(
            state.privileges(id).map(|p| p.privileges),
            Some(PrivilegeSet::from_privileges([Privilege::Insert]))
        );
        state.remove_privileges(id);
        assert!(state.privileges(id).is_none());
    }

    #[test]
    fn empty_file_is_empty_state() -> Result<()> {
        assert_eq!(RecordedState::from_json("{}")?, RecordedState::default());
        Ok(())
    }
}
