//! TaskFlow server and command-line client.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskflow::api::{AppState, start_server};
use taskflow::auth::JwtGate;
use taskflow::cli::{Cli, Command, ServeArgs, TokenArgs, tasks};
use taskflow::client::TaskClient;
use taskflow::config::{Config, ConfigLoader};
use taskflow::db::Database;
use taskflow::logging::{self, LogTarget};
use taskflow::types::UserId;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(PathBuf::from(path))?,
        None => ConfigLoader::load()?,
    };
    if let Some(path) = loader.config_path() {
        debug!("Loaded config from {:?}", path);
    }
    let mut config = loader.into_config();

    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(server) = &cli.server {
        config.client.server_url = server.clone();
    }

    match cli.command {
        Some(Command::Serve(args)) => serve(config, args).await,
        None => serve(config, ServeArgs::default()).await,
        Some(Command::Token(args)) => issue_token(&config, args),
        Some(Command::Tasks(command)) => {
            let client = TaskClient::new(
                config.client.server_url.clone(),
                Duration::from_secs(config.client.timeout_seconds),
            )?;
            let output = tasks::run(command, &client, cli.token).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let secret = config.auth.require_secret()?;
    let gate = JwtGate::new(secret, config.auth.issuer.clone());

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path).with_context(|| {
        format!("failed to open database {}", config.server.db_path.display())
    })?;

    info!("Database: {:?}", config.server.db_path);

    let state = AppState::new(Arc::new(db), Arc::new(gate));
    let (shutdown_tx, _addr) = start_server(state, config.server.bind_addr()).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    let _ = shutdown_tx.send(());

    Ok(())
}

fn issue_token(config: &Config, args: TokenArgs) -> Result<()> {
    let secret = config.auth.require_secret()?;
    let gate = JwtGate::new(secret, config.auth.issuer.clone());

    let hours = args.hours.unwrap_or(config.auth.token_ttl_hours);
    let token = gate.issue_for_hours(&UserId::new(args.user), hours)?;
    println!("{token}");
    Ok(())
}
