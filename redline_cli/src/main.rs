//! Redline CLI
//!

#![deny(missing_docs)]

use anyhow::Result;

use redline_lib::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    cli().await
}
