//! The privilege model for a (schema, group) association.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Where a privilege applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeScope {
    /// Applies to the tables in a schema, present and future.
    Table,
    /// Applies to the schema object itself.
    Schema,
}

/// One of the seven flags a group can hold on a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    /// SELECT on tables
    Select,
    /// INSERT on tables
    Insert,
    /// UPDATE on tables
    Update,
    /// DELETE on tables
    Delete,
    /// REFERENCES on tables
    References,
    /// USAGE on the schema
    Usage,
    /// CREATE on the schema
    Create,
}

impl Privilege {
    /// Every privilege, in statement order.
    pub const ALL: [Privilege; 7] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
        Privilege::References,
        Privilege::Usage,
        Privilege::Create,
    ];

    /// Table vs. schema level.
    pub fn scope(&self) -> PrivilegeScope {
        match self {
            Privilege::Usage | Privilege::Create => PrivilegeScope::Schema,
            _ => PrivilegeScope::Table,
        }
    }

    /// The keyword used in GRANT and REVOKE.
    pub fn keyword(&self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::References => "REFERENCES",
            Privilege::Usage => "USAGE",
            Privilege::Create => "CREATE",
        }
    }

    /// The character Postgres uses for this privilege in ACL text.
    pub fn acl_char(&self) -> char {
        match self {
            Privilege::Select => 'r',
            Privilege::Insert => 'a',
            Privilege::Update => 'w',
            Privilege::Delete => 'd',
            Privilege::References => 'x',
            Privilege::Usage => 'U',
            Privilege::Create => 'C',
        }
    }

    /// Reverse of [`Privilege::acl_char`].
    pub fn from_acl_char(c: char) -> Option<Self> {
        Privilege::ALL.into_iter().find(|p| p.acl_char() == c)
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Seven independent flags. Serialized flat, the way the resource
/// configuration spells them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeSet {
    /// SELECT on tables
    pub select: bool,
    /// INSERT on tables
    pub insert: bool,
    /// UPDATE on tables
    pub update: bool,
    /// DELETE on tables
    pub delete: bool,
    /// REFERENCES on tables
    pub references: bool,
    /// USAGE on the schema
    pub usage: bool,
    /// CREATE on the schema
    pub create: bool,
}

impl PrivilegeSet {
    /// Build a set from the privileges that should be true.
    pub fn from_privileges(privileges: impl IntoIterator<Item = Privilege>) -> Self {
        let mut res = Self::default();
        for p in privileges {
            res.set(p, true);
        }
        res
    }

    /// Read one flag.
    pub fn get(&self, privilege: Privilege) -> bool {
        match privilege {
            Privilege::Select => self.select,
            Privilege::Insert => self.insert,
            Privilege::Update => self.update,
            Privilege::Delete => self.delete,
            Privilege::References => self.references,
            Privilege::Usage => self.usage,
            Privilege::Create => self.create,
        }
    }

    /// Write one flag.
    pub fn set(&mut self, privilege: Privilege, value: bool) {
        let flag = match privilege {
            Privilege::Select => &mut self.select,
            Privilege::Insert => &mut self.insert,
            Privilege::Update => &mut self.update,
            Privilege::Delete => &mut self.delete,
            Privilege::References => &mut self.references,
            Privilege::Usage => &mut self.usage,
            Privilege::Create => &mut self.create,
        };
        *flag = value;
    }

    /// The true flags, in statement order.
    pub fn granted(&self) -> impl Iterator<Item = Privilege> + '_ {
        Privilege::ALL.into_iter().filter(|p| self.get(*p))
    }

    /// The true flags of one scope, in statement order.
    pub fn granted_in(&self, scope: PrivilegeScope) -> Vec<Privilege> {
        self.granted().filter(|p| p.scope() == scope).collect()
    }

    /// All flags false. Such an association shouldn't exist.
    pub fn is_empty(&self) -> bool {
        self.granted().next().is_none()
    }
}

impl Display for PrivilegeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let granted = self.granted().map(|p| p.keyword()).collect::<Vec<_>>();
        if granted.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", granted.join(", "))
        }
    }
}
