use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roadline_backend::config::Config;
use roadline_backend::rest::{router, AppState};
use roadline_backend::storage::csv::CsvConnection;
use roadline_backend::storage::sqlite::SqliteConnection;
use roadline_backend::storage::traits::Connection;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // Probe the primary backing once; everything after startup goes through
    // whichever backing won, with no per-call branching.
    match SqliteConnection::connect(&config.database_url).await {
        Ok(connection) => serve(connection, &config).await,
        Err(e) => {
            warn!("sqlite unavailable, falling back to csv storage: {e:#}");
            let connection = CsvConnection::new(&config.data_dir)?;
            serve(connection, &config).await
        }
    }
}

async fn serve<C: Connection>(connection: C, config: &Config) -> Result<()> {
    let app = router(AppState::new(&connection));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
