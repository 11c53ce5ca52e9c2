mod admin;
mod app;
mod chat;
mod completion;
mod config;
mod conversation_log;
mod customers;
mod error;
mod intake;
mod intent;
mod prompting;
mod types;

use anyhow::Result;
use config::{AppConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` applies.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level))
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(config: &AppConfig) {
    let filter = log_filter(&config.logging.level);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_env_filter(filter)
                .compact()
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_env_filter(filter)
                .pretty()
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_env_filter(filter)
                .json()
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config);

    app::run(config).await
}
