//! Scripted cluster for the command tests.
//!
//! Catalog queries are answered from canned rows picked by substring; the
//! parameters are ignored. Statements are only recorded.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redline_core::{error::BoxError, Connection, Row, SqlValue, Transaction};

/// Substrings that pick out each catalog query.
pub(crate) const SCHEMA_INFO: &str = "AS nspowner FROM";
pub(crate) const SCHEMA_STATE: &str = "svv_schema_quota_state";
pub(crate) const SCHEMA_ACL: &str = "nspacl";
pub(crate) const DEFAULT_ACL: &str = "defaclacl";
pub(crate) const GROUP_NAME: &str = "pg_group";

#[derive(Debug, Default)]
struct Script {
    replies: Vec<(&'static str, Vec<Row>)>,
    executed: Vec<String>,
    fail_exec_containing: Option<String>,
}

/// Cloning shares the same script.
#[derive(Clone, Debug, Default)]
pub(crate) struct ScriptedCluster {
    script: Arc<Mutex<Script>>,
}

impl ScriptedCluster {
    /// Answer queries containing `needle` with `rows`, replacing any
    /// earlier answer for it.
    pub(crate) fn reply(self, needle: &'static str, rows: Vec<Row>) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            script.replies.retain(|(n, _)| *n != needle);
            script.replies.push((needle, rows));
        }
        self
    }

    pub(crate) fn text(self, needle: &'static str, value: &str) -> Self {
        self.reply(needle, vec![Row::new([value])])
    }

    pub(crate) fn fail_exec_containing(&self, needle: &str) {
        self.script.lock().unwrap().fail_exec_containing = Some(needle.to_owned());
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.script.lock().unwrap().executed.clone()
    }
}

/// The cluster most tests start from: schema `analytics` owned by 100 and
/// group `analysts`, with no grants.
pub(crate) fn analytics() -> ScriptedCluster {
    ScriptedCluster::default()
        .reply(
            SCHEMA_INFO,
            vec![Row::new([SqlValue::from("analytics"), SqlValue::Int(100)])],
        )
        .reply(
            SCHEMA_STATE,
            vec![Row::new([
                SqlValue::from("analytics"),
                SqlValue::Int(100),
                SqlValue::Int(0),
            ])],
        )
        .text(GROUP_NAME, "analysts")
        .reply(SCHEMA_ACL, vec![Row::new([SqlValue::Null])])
}

/// A state file path no other test uses.
pub(crate) fn state_path(test: &str) -> PathBuf {
    let path =
        std::env::temp_dir().join(format!("redline_{}_{test}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[async_trait]
impl Connection for ScriptedCluster {
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, BoxError> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl Transaction for ScriptedCluster {
    async fn query_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, BoxError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    async fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, BoxError> {
        let script = self.script.lock().unwrap();
        Ok(script
            .replies
            .iter()
            .find(|(needle, _)| sql.contains(needle))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        let mut script = self.script.lock().unwrap();
        script.executed.push(sql.to_owned());
        match &script.fail_exec_containing {
            Some(needle) if sql.contains(needle.as_str()) => Err("permission denied".into()),
            _ => Ok(0),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), BoxError> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BoxError> {
        Ok(())
    }
}
