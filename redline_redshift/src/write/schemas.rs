//! managing the write path for schemas

use super::quote_ident;

/// `QUOTA` clause value. 0 means unlimited.
fn quota_clause(quota: i64) -> String {
    if quota > 0 {
        format!("{quota} MB")
    } else {
        "UNLIMITED".to_owned()
    }
}

/// Create a schema, optionally owned by someone other than the connecting
/// user.
pub fn create_schema(name: &str, owner: Option<&str>, quota: i64) -> String {
    let mut res = format!("CREATE SCHEMA {}", quote_ident(name));
    if let Some(owner) = owner {
        res.push_str(&format!(" AUTHORIZATION {}", quote_ident(owner)));
    }
    res.push_str(&format!(" QUOTA {}", quota_clause(quota)));
    res
}

/// Rename a schema.
pub fn rename_schema(old: &str, new: &str) -> String {
    format!(
        "ALTER SCHEMA {} RENAME TO {}",
        quote_ident(old),
        quote_ident(new)
    )
}

/// Hand a schema to another user.
pub fn alter_schema_owner(name: &str, owner: &str) -> String {
    format!(
        "ALTER SCHEMA {} OWNER TO {}",
        quote_ident(name),
        quote_ident(owner)
    )
}

/// Change a schema's disk quota.
pub fn alter_schema_quota(name: &str, quota: i64) -> String {
    format!("ALTER SCHEMA {} QUOTA {}", quote_ident(name), quota_clause(quota))
}

/// Drop a schema. Without `cascade` the drop fails if anything is in it.
pub fn drop_schema(name: &str, cascade: bool) -> String {
    let mut res = format!("DROP SCHEMA {}", quote_ident(name));
    if cascade {
        res.push_str(" CASCADE");
    }
    res
}
