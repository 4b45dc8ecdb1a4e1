//! Commands for Redline CLI
//!

use std::path::PathBuf;

use clap::{self, Parser, Subcommand};

use redline_core::logging::LevelFilter;

/// Redline: declarative schema and privilege management for Redshift
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
pub(crate) struct RedlineArgs {
    #[clap(subcommand)]
    pub(crate) command: RedlineCommand,
    #[clap(global = true, short = 'v', long)]
    pub(crate) log_level: Option<LevelFilter>,
    /// Connection config
    #[clap(global = true, long, default_value = "redline.yaml")]
    pub(crate) config: PathBuf,
    /// Desired schemas and privileges
    #[clap(global = true, long, default_value = "resources.yaml")]
    pub(crate) resources: PathBuf,
    /// State recorded by previous runs
    #[clap(global = true, long, default_value = "redline_state.json")]
    pub(crate) state: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum RedlineCommand {
    /// Check that the cluster is reachable with the configured credentials
    Check,
    /// Show the changes needed to reach the configured state
    Plan {
        /// Re-read every recorded resource from the cluster first
        #[clap(short, long, value_parser, default_value = "false")]
        fetch: bool,
    },
    /// Apply the planned changes
    Apply {
        /// Plan against the recorded state without re-reading the cluster
        #[clap(short, long, value_parser, default_value = "false")]
        no_fetch: bool,
    },
    /// Start managing something that already exists
    Import {
        #[clap(subcommand)]
        target: ImportTarget,
    },
    /// Revoke and drop everything in the recorded state
    Destroy,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ImportTarget {
    /// A schema, by oid
    Schema {
        /// `pg_namespace.oid`
        id: i64,
    },
    /// A group's privileges on a schema, as `<schema_id>_<group_id>`
    Privilege {
        /// `<schema_id>_<group_id>`
        id: String,
    },
}
