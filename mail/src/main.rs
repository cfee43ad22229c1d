use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use mail::{LogMailer, build_service, run};
use shared::config::load_config;
use shared::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "mail", about = "Transactional mail and email token service")]
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

    let service = Arc::new(build_service(&config.mail, LogMailer)?);

    let addr = config.mail.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!(
        "Mail service up, sending as {} <{}>",
        config.mail.sender_name, config.mail.sender_email
    );

    tokio::select! {
        result = run(listener, service, &config.mail) => {
            if let Err(e) = &result {
                error!("Mail service stopped: {:#}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down mail service");
            Ok(())
        }
    }
}
