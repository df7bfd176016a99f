//! Trek CLI - plan trips and pack for them from the command line
//!
//! Packing toggles are applied optimistically and confirmed against the API.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::collab::run_collab;
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::invites::run_invites;
use crate::commands::notifications::run_notifications;
use crate::commands::pack::run_pack;
use crate::commands::trips::run_trips;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "trek=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(CliError::Io)?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
        Commands::Auth { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_auth(command, &context).await?;
        }
        Commands::Trips { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_trips(command, &context).await?;
        }
        Commands::Pack { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_pack(command, &context).await?;
        }
        Commands::Invites { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_invites(command, &context).await?;
        }
        Commands::Collab { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_collab(command, &context).await?;
        }
        Commands::Notifications { command } => {
            let context = CliContext::resolve(profile, cli.api_url)?;
            run_notifications(command, &context).await?;
        }
    }

    Ok(())
}
