mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use environment_settings::EnvironmentSettingsModule;
use ppkit_http::{HttpExecutorBuilder, StaticBearerToken};
use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::commands::Action;
use crate::config::AppConfig;

/// Read and update organization settings of Power Platform environments
#[derive(Parser)]
#[command(name = "pp-settings", version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token sent with every request
    #[arg(long, env = "PP_SETTINGS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the environment descriptor from the admin API
    Describe { environment_id: String },
    /// Print the host of the linked data service
    Host { environment_id: String },
    /// Report whether a data service is linked
    Linked { environment_id: String },
    /// Print the organization settings record
    Get { environment_id: String },
    /// Apply settings, then print the record as re-read from the service
    Update {
        environment_id: String,
        /// Setting to apply; the value is parsed as JSON, else taken as a string
        #[arg(long = "set", value_name = "KEY=VALUE", required = true, value_parser = parse_set)]
        set: Vec<(String, Value)>,
    },
    /// Print effective configuration (YAML) and exit
    PrintConfig,
}

fn parse_set(raw: &str) -> Result<(String, Value), String> {
    commands::parse_assignment(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.logging, cli.verbose)?;

    let action = match cli.command {
        Commands::PrintConfig => {
            print!("{}", config.to_yaml()?);
            return Ok(());
        }
        Commands::Describe { environment_id } => Action::Describe(environment_id),
        Commands::Host { environment_id } => Action::Host(environment_id),
        Commands::Linked { environment_id } => Action::Linked(environment_id),
        Commands::Get { environment_id } => Action::Get(environment_id),
        Commands::Update {
            environment_id,
            set,
        } => Action::Update(environment_id, set),
    };

    let token = cli
        .token
        .context("no bearer token: pass --token or set PP_SETTINGS_TOKEN")?;
    let executor = HttpExecutorBuilder::with_config(config.http)
        .auth(Arc::new(StaticBearerToken::new(SecretString::from(token))))
        .build()
        .context("failed to build HTTP executor")?;

    let module = EnvironmentSettingsModule::new(Arc::new(executor), config.environment_settings);
    let client = module.client();

    let ctx = CancellationToken::new();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight request");
            on_interrupt.cancel();
        }
    });

    let output = commands::run(client.as_ref(), &ctx, action).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
