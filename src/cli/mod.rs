//! CLI command definitions for taskflow
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod tasks;

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use tasks::TaskCommand;

/// TaskFlow task server and command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips tier discovery)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Server URL for client commands (overrides config)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Bearer token for client commands
    #[arg(long, env = "TASKFLOW_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server (default if no subcommand given)
    Serve(ServeArgs),

    /// Mint a bearer token for a user id
    Token(TokenArgs),

    #[command(flatten)]
    Tasks(TaskCommand),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// User id placed in the token subject
    #[arg(short, long)]
    pub user: String,

    /// Lifetime in hours (default: auth.token_ttl_hours)
    #[arg(long)]
    pub hours: Option<i64>,
}
