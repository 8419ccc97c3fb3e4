//! chainjpeg binary entry point.
//!
//! This is a thin wrapper around the chainjpeg library that:
//! 1. Initializes logging
//! 2. Parses and validates configuration
//! 3. Runs the selected command

use anyhow::Result;
use chainjpeg::{ChainConfig, Pipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ChainConfig::from_args();
    tracing::info!(
        root = %config.root.display(),
        color = %config.color,
        nibble = config.nibble,
        "Configuration loaded"
    );
    config.validate()?;

    Pipeline::new(config).run().await?;
    Ok(())
}
