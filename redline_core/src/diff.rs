//! Diffing desired privileges against recorded ones.

use crate::error::{Error, Result};
use crate::privileges::{Privilege, PrivilegeSet};

/// One flag that needs to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivilegeChange {
    /// The flag.
    pub privilege: Privilege,
    /// `true` to grant, `false` to revoke.
    pub grant: bool,
}

impl PrivilegeChange {
    /// Grant the privilege.
    pub fn grant(privilege: Privilege) -> Self {
        Self {
            privilege,
            grant: true,
        }
    }

    /// Revoke the privilege.
    pub fn revoke(privilege: Privilege) -> Self {
        Self {
            privilege,
            grant: false,
        }
    }
}

/// Reject a desired set that grants nothing.
pub fn validate_desired(desired: &PrivilegeSet) -> Result<()> {
    if desired.is_empty() {
        Err(Error::validation("must have at least 1 privilege"))
    } else {
        Ok(())
    }
}

/// The changes needed to go from `previous` to `desired`, in statement order.
///
/// `None` means nothing was recorded yet, so only the true flags of
/// `desired` show up.
pub fn diff(previous: Option<&PrivilegeSet>, desired: &PrivilegeSet) -> Vec<PrivilegeChange> {
    let previous = previous.copied().unwrap_or_default();
    Privilege::ALL
        .into_iter()
        .filter(|p| previous.get(*p) != desired.get(*p))
        .map(|p| PrivilegeChange {
            privilege: p,
            grant: desired.get(p),
        })
        .collect()
}
