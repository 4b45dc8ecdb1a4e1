//! Decoding of catalog ACL text.
//!
//! Catalog ACL columns are arrays of `grantee=privileges/grantor` items. The
//! reader flattens them with `array_to_string(acl, '|')`, and this module turns
//! that text into [`AclEntry`] values so string slicing stays out of the
//! reconciliation logic.

use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;

use crate::privileges::{Privilege, PrivilegeScope, PrivilegeSet};

/// Separator used by the catalog queries when flattening ACL arrays.
pub const ACL_SEPARATOR: char = '|';

/// Who an ACL entry grants to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grantee {
    /// Everyone (empty grantee).
    Public,
    /// A user.
    User(String),
    /// A group, written `group <name>` in the ACL.
    Group(String),
}

/// One decoded `grantee=privileges/grantor` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// The role receiving the privileges.
    pub grantee: Grantee,
    /// Raw privilege characters, including ones redline doesn't manage.
    pub privileges: BTreeSet<char>,
    /// Characters that were followed by `*` (with grant option).
    pub grant_options: BTreeSet<char>,
    /// The role that granted them.
    pub grantor: String,
}

/// An ACL item that doesn't follow `grantee=privileges/grantor`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed ACL item {item:?}: {reason}")]
pub struct AclParseError {
    item: String,
    reason: &'static str,
}

impl AclEntry {
    /// Whether this entry carries the given privilege.
    pub fn has(&self, privilege: Privilege) -> bool {
        self.privileges.contains(&privilege.acl_char())
    }

    /// Whether this entry targets the named group.
    pub fn is_for_group(&self, group: &str) -> bool {
        matches!(&self.grantee, Grantee::Group(g) if g == group)
    }
}

impl FromStr for AclEntry {
    type Err = AclParseError;

    fn from_str(item: &str) -> Result<Self, Self::Err> {
        let err = |reason| AclParseError {
            item: item.to_owned(),
            reason,
        };
        let eq = find_unquoted(item, '=').ok_or_else(|| err("missing '='"))?;
        let (grantee_raw, rest) = (&item[..eq], &item[eq + 1..]);
        let (privs_raw, grantor_raw) = rest.split_once('/').ok_or_else(|| err("missing '/'"))?;

        let mut privileges = BTreeSet::new();
        let mut grant_options = BTreeSet::new();
        let mut last = None;
        for c in privs_raw.chars() {
            match c {
                '*' => {
                    let prev = last.ok_or_else(|| err("'*' without a privilege"))?;
                    grant_options.insert(prev);
                }
                c if c.is_ascii_alphabetic() => {
                    privileges.insert(c);
                    last = Some(c);
                }
                _ => return Err(err("unexpected privilege character")),
            }
        }

        let grantee_raw = grantee_raw.trim();
        let grantee = if grantee_raw.is_empty() {
            Grantee::Public
        } else if let Some(group) = grantee_raw.strip_prefix("group ") {
            Grantee::Group(unquote(group.trim()))
        } else {
            Grantee::User(unquote(grantee_raw))
        };

        Ok(AclEntry {
            grantee,
            privileges,
            grant_options,
            grantor: unquote(grantor_raw.trim()),
        })
    }
}

/// Decode a flattened ACL. `None` or empty text means no entries.
pub fn parse_acl(text: Option<&str>) -> Result<Vec<AclEntry>, AclParseError> {
    let Some(text) = text else {
        return Ok(vec![]);
    };
    split_unquoted(text, ACL_SEPARATOR)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(AclEntry::from_str)
        .collect()
}

/// The flags of one scope that the group holds across all entries.
/// Flags of the other scope are left false.
pub fn group_privileges(entries: &[AclEntry], group: &str, scope: PrivilegeScope) -> PrivilegeSet {
    PrivilegeSet::from_privileges(
        Privilege::ALL
            .into_iter()
            .filter(|p| p.scope() == scope)
            .filter(|p| entries.iter().any(|e| e.is_for_group(group) && e.has(*p))),
    )
}

/// Remove surrounding double quotes and undouble embedded ones.
fn unquote(s: &str) -> String {
    match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => s.to_owned(),
    }
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            c if c == needle && !quoted => return Some(i),
            _ => (),
        }
    }
    None
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut res = vec![];
    let mut rest = s;
    while let Some(i) = find_unquoted(rest, sep) {
        res.push(&rest[..i]);
        rest = &rest[i + sep.len_utf8()..];
    }
    res.push(rest);
    res
}
