//! In-memory warehouse used by the integration tests.
//!
//! Catalog queries are matched by substring, the generated GRANT/REVOKE and
//! SCHEMA statements are interpreted against a small catalog model. Every
//! transaction works on a snapshot that only replaces the shared catalog on
//! commit.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redline_core::{
    error::BoxError, privileges::Privilege, privileges::PrivilegeScope, Connection, Row,
    SqlValue, Transaction,
};

pub const ADMIN: &str = "admin";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FakeSchema {
    pub name: String,
    pub owner: i64,
    pub quota: i64,
    /// group -> schema privilege chars
    pub acl: BTreeMap<String, BTreeSet<char>>,
    /// group -> table default-privilege chars
    pub default_acl: BTreeMap<String, BTreeSet<char>>,
    /// group -> privilege chars on the existing tables
    pub table_grants: BTreeMap<String, BTreeSet<char>>,
    pub tables: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub schemas: BTreeMap<i64, FakeSchema>,
    pub groups: BTreeMap<i64, String>,
    pub users: BTreeMap<i64, String>,
    next_oid: i64,
}

impl Catalog {
    fn schema_mut(&mut self, name: &str) -> Result<&mut FakeSchema, BoxError> {
        self.schemas
            .values_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| format!("schema \"{name}\" does not exist").into())
    }

    fn check_group(&self, name: &str) -> Result<(), BoxError> {
        if self.groups.values().any(|g| g == name) {
            Ok(())
        } else {
            Err(format!("group \"{name}\" does not exist").into())
        }
    }

    fn check_user(&self, name: &str) -> Result<i64, BoxError> {
        self.users
            .iter()
            .find(|(_, u)| *u == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| format!("user \"{name}\" does not exist").into())
    }
}

#[derive(Debug, Default)]
struct Inner {
    catalog: Catalog,
    begins: usize,
    queries: usize,
    executed: Vec<String>,
    commits: usize,
    rollbacks: usize,
    fail_exec_at: Option<usize>,
    fail_query_containing: Option<String>,
    fail_commit: bool,
    fail_rollback: bool,
}

/// Cloning shares the same warehouse.
#[derive(Clone, Debug, Default)]
pub struct FakeWarehouse {
    inner: Arc<Mutex<Inner>>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        let warehouse = Self::default();
        {
            let mut inner = warehouse.inner.lock().unwrap();
            inner.catalog.next_oid = 100_000;
            inner.catalog.users.insert(1, "rdsdb".to_owned());
            inner.catalog.users.insert(100, ADMIN.to_owned());
            inner.catalog.schemas.insert(
                11,
                FakeSchema {
                    name: "pg_catalog".to_owned(),
                    owner: 1,
                    ..Default::default()
                },
            );
        }
        warehouse
    }

    pub fn with_schema(self, oid: i64, name: &str) -> Self {
        self.inner.lock().unwrap().catalog.schemas.insert(
            oid,
            FakeSchema {
                name: name.to_owned(),
                owner: 100,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_group(self, id: i64, name: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .catalog
            .groups
            .insert(id, name.to_owned());
        self
    }

    pub fn with_user(self, id: i64, name: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .catalog
            .users
            .insert(id, name.to_owned());
        self
    }

    /// Make the nth executed statement (1-based, counted across the
    /// warehouse's lifetime) fail.
    pub fn fail_exec_at(&self, n: usize) {
        self.inner.lock().unwrap().fail_exec_at = Some(n);
    }

    pub fn fail_query_containing(&self, needle: &str) {
        self.inner.lock().unwrap().fail_query_containing = Some(needle.to_owned());
    }

    pub fn fail_commit(&self) {
        self.inner.lock().unwrap().fail_commit = true;
    }

    pub fn fail_rollback(&self) {
        self.inner.lock().unwrap().fail_rollback = true;
    }

    pub fn catalog(&self) -> Catalog {
        self.inner.lock().unwrap().catalog.clone()
    }

    pub fn edit_catalog(&self, f: impl FnOnce(&mut Catalog)) {
        f(&mut self.inner.lock().unwrap().catalog)
    }

    pub fn begins(&self) -> usize {
        self.inner.lock().unwrap().begins
    }

    pub fn queries(&self) -> usize {
        self.inner.lock().unwrap().queries
    }

    /// Every statement that was attempted, committed or not.
    pub fn executed(&self) -> Vec<String> {
        self.inner.lock().unwrap().executed.clone()
    }

    pub fn commits(&self) -> usize {
        self.inner.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.lock().unwrap().rollbacks
    }

    pub fn reset_counters(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.begins = 0;
        inner.queries = 0;
        inner.executed.clear();
        inner.commits = 0;
        inner.rollbacks = 0;
    }
}

#[async_trait]
impl Connection for FakeWarehouse {
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn Transaction + 'a>, BoxError> {
        let snapshot = {
            let mut inner = self.inner.lock().unwrap();
            inner.begins += 1;
            inner.catalog.clone()
        };
        Ok(Box::new(FakeTransaction {
            warehouse: self.clone(),
            working: snapshot,
        }))
    }
}

struct FakeTransaction {
    warehouse: FakeWarehouse,
    working: Catalog,
}

#[async_trait]
impl Transaction for FakeTransaction {
    async fn query_row(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, BoxError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BoxError> {
        {
            let mut inner = self.warehouse.inner.lock().unwrap();
            inner.queries += 1;
            if let Some(needle) = &inner.fail_query_containing {
                if sql.contains(needle.as_str()) {
                    return Err("relation does not exist".into());
                }
            }
        }
        answer(&self.working, sql, params)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        let fail = {
            let mut inner = self.warehouse.inner.lock().unwrap();
            inner.executed.push(sql.to_owned());
            inner.fail_exec_at == Some(inner.executed.len())
        };
        if fail {
            return Err("injected failure".into());
        }
        interpret(&mut self.working, sql)?;
        Ok(0)
    }

    async fn commit(self: Box<Self>) -> Result<(), BoxError> {
        let FakeTransaction { warehouse, working } = *self;
        let mut inner = warehouse.inner.lock().unwrap();
        if inner.fail_commit {
            inner.rollbacks += 1;
            return Err("serializable isolation violation".into());
        }
        inner.commits += 1;
        inner.catalog = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), BoxError> {
        let mut inner = self.warehouse.inner.lock().unwrap();
        inner.rollbacks += 1;
        if inner.fail_rollback {
            return Err("server closed the connection unexpectedly".into());
        }
        Ok(())
    }
}

fn int_param(params: &[SqlValue]) -> Result<i64, BoxError> {
    match params.first() {
        Some(SqlValue::Int(v)) => Ok(*v),
        other => Err(format!("expected an integer parameter, got {other:?}").into()),
    }
}

fn text_param(params: &[SqlValue]) -> Result<&str, BoxError> {
    match params.first() {
        Some(SqlValue::Text(v)) => Ok(v.as_str()),
        other => Err(format!("expected a text parameter, got {other:?}").into()),
    }
}

fn acl_text(entries: &BTreeMap<String, BTreeSet<char>>) -> Option<String> {
    let items = entries
        .iter()
        .filter(|(_, chars)| !chars.is_empty())
        .map(|(group, chars)| {
            let group = if group.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
                group.to_owned()
            } else {
                format!("\"{}\"", group.replace('"', "\"\""))
            };
            format!("group {group}={}/{ADMIN}", chars.iter().collect::<String>())
        })
        .collect::<Vec<_>>();
    (!items.is_empty()).then(|| items.join("|"))
}

fn answer(catalog: &Catalog, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, BoxError> {
    let rows = if sql.contains("svv_schema_quota_state") {
        let id = int_param(params)?;
        catalog
            .schemas
            .get(&id)
            .map(|s| {
                Row::new([
                    SqlValue::from(s.name.as_str()),
                    SqlValue::Int(s.owner),
                    SqlValue::Int(s.quota),
                ])
            })
            .into_iter()
            .collect()
    } else if sql.contains("pg_default_acl") {
        let id = int_param(params)?;
        catalog
            .schemas
            .get(&id)
            .and_then(|s| acl_text(&s.default_acl))
            .map(|text| Row::new([SqlValue::Text(text)]))
            .into_iter()
            .collect()
    } else if sql.contains("array_to_string(nspacl") {
        let id = int_param(params)?;
        catalog
            .schemas
            .get(&id)
            .map(|s| match acl_text(&s.acl) {
                Some(text) => Row::new([SqlValue::Text(text)]),
                None => Row::new([SqlValue::Null]),
            })
            .into_iter()
            .collect()
    } else if sql.contains("pg_group") {
        let id = int_param(params)?;
        catalog
            .groups
            .get(&id)
            .map(|g| Row::new([SqlValue::from(g.as_str())]))
            .into_iter()
            .collect()
    } else if sql.contains("pg_user") {
        let id = int_param(params)?;
        catalog
            .users
            .get(&id)
            .map(|u| Row::new([SqlValue::from(u.as_str())]))
            .into_iter()
            .collect()
    } else if sql.contains("WHERE nspname = $1") {
        let name = text_param(params)?;
        catalog
            .schemas
            .iter()
            .filter(|(_, s)| s.name == name)
            .map(|(oid, _)| Row::new([SqlValue::Int(*oid)]))
            .collect()
    } else if sql.contains("nspowner") {
        let id = int_param(params)?;
        catalog
            .schemas
            .get(&id)
            .map(|s| Row::new([SqlValue::from(s.name.as_str()), SqlValue::Int(s.owner)]))
            .into_iter()
            .collect()
    } else {
        return Err(format!("unexpected query: {sql}").into());
    };
    Ok(rows)
}

/// Split statement text on whitespace, keeping double-quoted identifiers
/// whole and unquoted.
fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn privilege_chars(list: &str, scope: PrivilegeScope) -> Result<BTreeSet<char>, BoxError> {
    let mut res = BTreeSet::new();
    for keyword in list.split(',') {
        if keyword == "ALL" {
            res.extend(
                Privilege::ALL
                    .into_iter()
                    .filter(|p| p.scope() == scope)
                    .map(|p| p.acl_char()),
            );
            continue;
        }
        let privilege = Privilege::ALL
            .into_iter()
            .find(|p| p.keyword() == keyword)
            .ok_or_else(|| format!("unknown privilege {keyword}"))?;
        if privilege.scope() != scope {
            return Err(format!("invalid privilege type {keyword} for this object").into());
        }
        res.insert(privilege.acl_char());
    }
    Ok(res)
}

fn grant(
    map: &mut BTreeMap<String, BTreeSet<char>>,
    group: &str,
    chars: BTreeSet<char>,
    add: bool,
) {
    let entry = map.entry(group.to_owned()).or_default();
    if add {
        entry.extend(chars);
    } else {
        entry.retain(|c| !chars.contains(c));
    }
    if entry.is_empty() {
        map.remove(group);
    }
}

fn quota(tokens: &[&str]) -> Result<i64, BoxError> {
    match tokens {
        ["UNLIMITED"] => Ok(0),
        [n, "MB"] => Ok(n.parse()?),
        _ => Err(format!("bad quota {tokens:?}").into()),
    }
}

fn interpret(catalog: &mut Catalog, sql: &str) -> Result<(), BoxError> {
    let owned = tokenize(sql);
    let tokens = owned.iter().map(String::as_str).collect::<Vec<_>>();
    use PrivilegeScope::{Schema, Table};
    match tokens.as_slice() {
        ["GRANT", privs, "ON", "ALL", "TABLES", "IN", "SCHEMA", s, "TO", "GROUP", g] => {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Table)?;
            grant(&mut catalog.schema_mut(s)?.table_grants, g, chars, true);
        }
        ["REVOKE", privs, "ON", "ALL", "TABLES", "IN", "SCHEMA", s, "FROM", "GROUP", g] => {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Table)?;
            grant(&mut catalog.schema_mut(s)?.table_grants, g, chars, false);
        }
        ["ALTER", "DEFAULT", "PRIVILEGES", "IN", "SCHEMA", s, "GRANT", privs, "ON", "TABLES", "TO", "GROUP", g] =>
        {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Table)?;
            grant(&mut catalog.schema_mut(s)?.default_acl, g, chars, true);
        }
        ["ALTER", "DEFAULT", "PRIVILEGES", "IN", "SCHEMA", s, "REVOKE", privs, "ON", "TABLES", "FROM", "GROUP", g] =>
        {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Table)?;
            grant(&mut catalog.schema_mut(s)?.default_acl, g, chars, false);
        }
        ["GRANT", privs, "ON", "SCHEMA", s, "TO", "GROUP", g] => {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Schema)?;
            grant(&mut catalog.schema_mut(s)?.acl, g, chars, true);
        }
        ["REVOKE", privs, "ON", "SCHEMA", s, "FROM", "GROUP", g] => {
            catalog.check_group(g)?;
            let chars = privilege_chars(privs, Schema)?;
            grant(&mut catalog.schema_mut(s)?.acl, g, chars, false);
        }
        ["CREATE", "SCHEMA", name, rest @ ..] => {
            if catalog.schemas.values().any(|s| s.name == *name) {
                return Err(format!("schema \"{name}\" already exists").into());
            }
            let (owner, rest) = match rest {
                ["AUTHORIZATION", user, rest @ ..] => (catalog.check_user(user)?, rest),
                _ => (100, rest),
            };
            let quota = match rest {
                ["QUOTA", q @ ..] => quota(q)?,
                _ => return Err(format!("bad CREATE SCHEMA: {sql}").into()),
            };
            catalog.next_oid += 1;
            let oid = catalog.next_oid;
            catalog.schemas.insert(
                oid,
                FakeSchema {
                    name: name.to_string(),
                    owner,
                    quota,
                    ..Default::default()
                },
            );
        }
        ["ALTER", "SCHEMA", name, "RENAME", "TO", new] => {
            if catalog.schemas.values().any(|s| s.name == *new) {
                return Err(format!("schema \"{new}\" already exists").into());
            }
            catalog.schema_mut(name)?.name = new.to_string();
        }
        ["ALTER", "SCHEMA", name, "OWNER", "TO", user] => {
            let owner = catalog.check_user(user)?;
            catalog.schema_mut(name)?.owner = owner;
        }
        ["ALTER", "SCHEMA", name, "QUOTA", q @ ..] => {
            let quota = quota(q)?;
            catalog.schema_mut(name)?.quota = quota;
        }
        ["DROP", "SCHEMA", name, rest @ ..] => {
            let cascade = matches!(rest, ["CASCADE"]);
            let schema = catalog.schema_mut(name)?;
            if schema.tables > 0 && !cascade {
                return Err(format!(
                    "cannot drop schema {name} because other objects depend on it"
                )
                .into());
            }
            catalog.schemas.retain(|_, s| s.name != *name);
        }
        _ => return Err(format!("syntax error: {sql}").into()),
    }
    Ok(())
}
