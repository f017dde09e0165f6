use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use kronos_engine::{EngineError, KronosConfig};

#[derive(Parser)]
#[command(name = "kronos-server", about = "Time zone conversion boundary for JSON APIs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Validate the configuration and print the resolved zones
    Check(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(long, default_value = "kronos.toml", env = "KRONOS_CONFIG")]
    pub config: String,

    /// Override `api_port` from the configuration file
    #[arg(long, env = "KRONOS_PORT")]
    pub port: Option<u16>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub kronos: KronosConfig,
}

fn default_api_port() -> u16 {
    8080
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("'{path}': {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(format!("'{path}'")))
    }

    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}
