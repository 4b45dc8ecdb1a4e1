//! Full CLI library for Redline
//!

#![deny(missing_docs)]

mod apply;
mod cmd;
mod fetch;
mod import;
mod plan;
mod state;
#[cfg(test)]
mod testing;

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use colored::Colorize;

use redline_core::{
    config::{ConnectionConfig, ResourcesConfig},
    log_runtime,
    logging::{self, info},
};
use redline_redshift::RedshiftClient;

use cmd::{RedlineArgs, RedlineCommand};
use state::RecordedState;

/// Main CLI entrypoint.
pub async fn cli() -> Result<()> {
    let args = RedlineArgs::parse();
    logging::setup(args.log_level);

    match &args.command {
        RedlineCommand::Check => {
            let client = connect(&args.config).await?;
            if client.check().await {
                println!("{}", "Success".green());
            } else {
                bail!("connected to the cluster, but couldn't run a query");
            }
        }
        RedlineCommand::Plan { fetch } => plan(&args, *fetch).await?,
        RedlineCommand::Apply { no_fetch } => apply(&args, !*no_fetch).await?,
        RedlineCommand::Import { target } => {
            let mut client = connect(&args.config).await?;
            let mut state = RecordedState::load(&args.state).await?;
            let snippet = import::import(&mut client, target, &mut state).await?;
            state.save(&args.state).await?;
            import::print_snippet(&snippet)?;
        }
        RedlineCommand::Destroy => destroy(&args).await?,
    }

    Ok(())
}

async fn connect(config_path: &Path) -> Result<RedshiftClient> {
    let config = ConnectionConfig::read_from_file(config_path).map_err(|e| {
        anyhow!(
            "unable to read {} - make sure it exists and has host, database and user set: {e:#}",
            config_path.display()
        )
    })?;
    Ok(RedshiftClient::connect(&config).await?)
}

/// Load the recorded state, optionally refreshed from the cluster. The
/// refreshed state is written back before anything else happens.
async fn current_state(
    args: &RedlineArgs,
    client: Option<&mut RedshiftClient>,
) -> Result<RecordedState> {
    let recorded = RecordedState::load(&args.state).await?;
    match client {
        Some(client) => {
            info!("refreshing recorded state");
            let refreshed = log_runtime!("refresh", fetch::refresh(client, &recorded).await)?;
            if refreshed != recorded {
                refreshed.save(&args.state).await?;
            }
            Ok(refreshed)
        }
        None => Ok(recorded),
    }
}

async fn plan(args: &RedlineArgs, fetch: bool) -> Result<()> {
    let desired = ResourcesConfig::read_from_file(&args.resources)?;
    let mut client = match fetch {
        true => Some(connect(&args.config).await?),
        false => None,
    };
    let state = current_state(args, client.as_mut()).await?;
    let changes = plan::plan_changes(&desired, &state)?;
    plan::print_plan(&changes);
    Ok(())
}

async fn apply(args: &RedlineArgs, fetch: bool) -> Result<()> {
    let desired = ResourcesConfig::read_from_file(&args.resources)?;
    let mut client = connect(&args.config).await?;
    let mut state = current_state(args, fetch.then_some(&mut client)).await?;
    let changes = plan::plan_changes(&desired, &state)?;
    plan::print_plan(&changes);
    if changes.is_empty() {
        return Ok(());
    }
    log_runtime!(
        "apply",
        apply::apply_changes(&mut client, &changes, &mut state, &args.state).await
    )?;
    println!("{}", "Success".green());
    Ok(())
}

async fn destroy(args: &RedlineArgs) -> Result<()> {
    let mut client = connect(&args.config).await?;
    let mut state = current_state(args, Some(&mut client)).await?;
    let changes = plan::plan_changes(&ResourcesConfig::default(), &state)?;
    plan::print_plan(&changes);
    apply::apply_changes(&mut client, &changes, &mut state, &args.state).await?;
    println!("{}", "Success".green());
    Ok(())
}
