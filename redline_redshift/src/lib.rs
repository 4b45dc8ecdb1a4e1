//! Redshift Connector
//!
//! Everything needed to read and reconcile schemas and schema/group
//! privileges on a Redshift cluster.
//!
//! ```no_run
//! use redline_core::{config::ConnectionConfig, Resource};
//! use redline_redshift::{RedshiftClient, SchemaGroupPrivilegeId, SchemaGroupPrivilegeResource};
//!
//! # async fn run() -> redline_core::Result<()> {
//! let config = ConnectionConfig::read_from_file("redline.yaml").unwrap();
//! let mut client = RedshiftClient::connect(&config).await?;
//! let id: SchemaGroupPrivilegeId = "1201_104".parse()?;
//! let state = SchemaGroupPrivilegeResource.read(&mut client, &id).await?;
//! println!("{}", state.privileges);
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod catalog;
mod client;
mod consts;
pub mod entry_types;
mod executor;
mod resources;
pub mod write;

pub use client::RedshiftClient;
pub use entry_types::*;
pub use resources::*;
