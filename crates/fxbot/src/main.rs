//! fxbot - Telegram trading-signal relay entry point.

use anyhow::Result;
use clap::Parser;
use fxbot::config::DEFAULT_CONFIG_PATH;
use tracing::info;

/// Telegram trading-signal relay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FXBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // .env is optional
    dotenvy::dotenv().ok();

    // Determine config path: CLI arg > FXBOT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("FXBOT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = fxbot::AppConfig::load(&config_path)?;
    config.apply_env()?;

    fxbot_telemetry::init_logging(config.telemetry.log_level.as_deref())?;
    info!("Starting fxbot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        channels = config.channels.len(),
        api_enabled = config.api.enabled,
        "Configuration loaded"
    );

    let app = fxbot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
