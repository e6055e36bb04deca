//! # Server Configuration
//!
//! One [`ServerConfig`] is parsed at startup from flags and environment
//! variables and passed down by reference. Nothing else reads the
//! environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use ppba_prover::KeyPaths;

/// Biometric key commitment service.
#[derive(Debug, Clone, Parser)]
#[command(name = "ppba-server", version, about)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "PPBA_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Groth16 proving key produced by `zkcli setup`.
    #[arg(long, env = "PROVING_KEY_PATH")]
    pub proving_key_path: PathBuf,

    /// Groth16 verifying key produced by `zkcli setup`.
    #[arg(long, env = "VERIFYING_KEY_PATH")]
    pub verifying_key_path: PathBuf,

    /// PostgreSQL DSN. Without it credentials live in memory only.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "PPBA_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub db_max_connections: u32,

    /// Maximum accepted request body, in bytes.
    #[arg(long, env = "PPBA_BODY_LIMIT", default_value_t = 2 * 1024 * 1024)]
    pub body_limit: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = "PPBA_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::new(&self.proving_key_path, &self.verifying_key_path)
    }
}
