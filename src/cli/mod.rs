//! Command line entry points

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// ForgeKit admin API - credentials, API keys and access control
#[derive(Parser)]
#[command(name = "forgekit-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Load and validate configuration, then exit
    CheckConfig,
}
