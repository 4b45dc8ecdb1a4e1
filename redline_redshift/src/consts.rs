//! Catalog queries and fixed ids.
//!
//! Every id column is cast to BIGINT so parameters and results cross the
//! connection seam as plain integers.

/// `nspowner` of the catalog-internal schemas (`pg_catalog`,
/// `information_schema`, ...). Grants on these are refused.
pub const SYSTEM_SCHEMA_OWNER: i64 = 1;

/// Name and owner of a schema.
pub const SCHEMA_INFO: &str = "SELECT trim(nspname) AS nspname, CAST(nspowner AS BIGINT) AS nspowner \
    FROM pg_namespace WHERE CAST(oid AS BIGINT) = $1";

/// Name, owner and quota (MB, 0 when unlimited) of a schema.
pub const SCHEMA_STATE: &str = "SELECT trim(nspname) AS nspname, CAST(nspowner AS BIGINT) AS nspowner, \
    CAST(coalesce(quota, 0) AS BIGINT) AS quota \
    FROM pg_namespace LEFT JOIN svv_schema_quota_state \
    ON svv_schema_quota_state.schema_id = pg_namespace.oid \
    WHERE CAST(pg_namespace.oid AS BIGINT) = $1";

/// Oid of a schema by name.
pub const SCHEMA_OID_BY_NAME: &str =
    "SELECT CAST(oid AS BIGINT) AS oid FROM pg_namespace WHERE nspname = $1";

/// Name of a group.
pub const GROUP_NAME: &str =
    "SELECT trim(groname) AS groname FROM pg_group WHERE CAST(grosysid AS BIGINT) = $1";

/// Name of a user.
pub const USER_NAME: &str =
    "SELECT trim(usename) AS usename FROM pg_user WHERE CAST(usesysid AS BIGINT) = $1";

/// The schema's own ACL, flattened with `|`.
pub const SCHEMA_ACL: &str = "SELECT array_to_string(nspacl, '|') AS acl \
    FROM pg_namespace WHERE CAST(oid AS BIGINT) = $1";

/// Table default-privilege ACLs scoped to the schema, one row per
/// `pg_default_acl` entry, flattened with `|`.
pub const DEFAULT_TABLE_ACL: &str = "SELECT array_to_string(defaclacl, '|') AS acl \
    FROM pg_default_acl \
    WHERE CAST(defaclnamespace AS BIGINT) = $1 AND defaclobjtype = 'r'";

/// Connectivity check.
pub const PING: &str = "SELECT 1";
