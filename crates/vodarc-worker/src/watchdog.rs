//! Watchdog health-check job.

use std::sync::Arc;

use tracing::debug;

use crate::context::Deps;
use crate::error::WorkerResult;

/// Probe the store and, when configured, the live-monitoring service.
pub(crate) async fn health_check(deps: Arc<Deps>, _args: serde_json::Value) -> WorkerResult<()> {
    deps.store().ping().await?;
    if let Some(monitor) = deps.live_monitor() {
        monitor.ping().await?;
    }
    debug!("Watchdog probes healthy");
    Ok(())
}
