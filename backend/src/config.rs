use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the CSV fallback files (and the default SQLite file).
    pub data_dir: PathBuf,
    /// SQLite connection string tried first by the startup probe.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var("ROADLINE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_data_dir(),
        };

        let database_url = match std::env::var("ROADLINE_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => format!("sqlite:{}", data_dir.join("roadline.db").display()),
        };

        let bind_addr = std::env::var("ROADLINE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3030".to_string())
            .parse()
            .context("invalid ROADLINE_ADDR")?;

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        info!("using data directory {}", data_dir.display());
        Ok(Self {
            data_dir,
            database_url,
            bind_addr,
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roadline-tracker")
}
