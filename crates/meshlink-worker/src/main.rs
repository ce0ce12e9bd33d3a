//! meshlink worker binary.
//!
//! - Loads `worker_ws` config (arg 1, else `$MESHLINK_CONFIG`, else `meshlink.yaml`)
//! - Joins the hub and logs every routed message it receives
//! - Stops cleanly on Ctrl-C

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use meshlink_core::error::{MeshError, Result};
use meshlink_worker::bus::TracingBus;
use meshlink_worker::{config, WorkerChannel};

const DEFAULT_CONFIG: &str = "meshlink.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.code().as_str(), "meshlink-worker failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MESHLINK_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;

    let channel = WorkerChannel::new(cfg.worker_ws, Arc::new(TracingBus));
    channel.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| MeshError::Internal(format!("signal handler failed: {e}")))?;

    tracing::info!("shutdown requested");
    channel.stop().await
}
