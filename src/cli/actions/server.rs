use crate::{cli::telemetry, config::ConfigHandle, dashboard};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    /// Candidate configuration files, the first existing one is used.
    pub config: Vec<PathBuf>,
    /// Overrides `app.port`.
    pub port: Option<u16>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration or templates cannot be loaded or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Startup args: {:?}", args);

    let config = Arc::new(
        ConfigHandle::load(args.config).context("Failed to load configuration")?,
    );
    let port = args.port.unwrap_or(config.snapshot().app.port);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = crate::GIT_COMMIT_HASH,
        "Starting dashgate"
    );

    let result = dashboard::new(port, config).await;

    telemetry::shutdown_tracer();

    result
}
