use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use session::{StoreBackend, build_sessions, run};
use shared::config::load_config;
use shared::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "session", about = "Session token service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let store = StoreBackend::from_config(&config.store)
        .await
        .context("Failed to open revocation store")?;
    let sessions = Arc::new(build_sessions(&config.session, store)?);

    let addr = config.session.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!(
        "Session service up, ttl {}s, timeout {:?}",
        sessions.ttl().as_secs(),
        config.session.request_timeout()
    );

    tokio::select! {
        result = run(listener, sessions, &config.session) => {
            if let Err(e) = &result {
                error!("Session service stopped: {:#}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down session service");
            Ok(())
        }
    }
}
