//! Standalone expiry reaper
//!
//! Sweeps expired token records on the configured schedule until interrupted.
//! Pass `--once` to run a single sweep and exit, e.g. from cron.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let services = fb_infra::initialize()
        .await
        .context("failed to initialize infrastructure")?;

    let reaper = Arc::new(
        services
            .expiry_reaper()
            .context("invalid reaper settings")?,
    );

    if once {
        let result = reaper.run_once().await;
        services.pool.close().await;
        if !result.is_success() {
            anyhow::bail!("sweep failed: {}", result.errors.join("; "));
        }
        return Ok(());
    }

    let handle = match Arc::clone(&reaper).spawn() {
        Some(handle) => handle,
        None => {
            warn!("Nothing to do, set REAPER_ENABLED=true to run the reaper");
            services.pool.close().await;
            return Ok(());
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown signal received, stopping expiry reaper");
    handle.abort();
    services.pool.close().await;

    Ok(())
}
