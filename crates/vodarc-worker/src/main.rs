//! Archiver worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vodarc_platform::{
    KickConfig, KickSource, PlatformSource, TokenCache, TwitchConfig, TwitchSource,
};
use vodarc_queue::{JobExecutor, JobQueue, JobRegistry, PeriodicScheduler};
use vodarc_store::MemoryStore;
use vodarc_worker::{jobs, CommandMediaRunner, Deps, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vodarc=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vodarc-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let tokens = Arc::new(TokenCache::new());
    // The persistent backend is wired by the deployment; the in-memory
    // store keeps a standalone worker functional.
    let store = Arc::new(MemoryStore::new());

    let mut deps = Deps::new(store, Arc::clone(&tokens), config.clone());

    let mut sources: Vec<Arc<dyn PlatformSource>> = Vec::new();
    match TwitchConfig::from_env() {
        Ok(twitch_config) => match TwitchSource::new(twitch_config, Arc::clone(&tokens)) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => error!("Failed to build Twitch source: {e}"),
        },
        Err(e) => warn!("Twitch source not configured: {e}"),
    }
    match KickConfig::from_env() {
        Ok(kick_config) => match KickSource::new(kick_config, Arc::clone(&tokens)) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => error!("Failed to build Kick source: {e}"),
        },
        Err(e) => warn!("Kick source not configured: {e}"),
    }
    for source in sources {
        if let Err(e) = source.authenticate().await {
            warn!(platform = %source.platform(), "Initial authentication failed: {e}");
        }
        deps = deps.with_source(source);
    }

    if let Some(media) = CommandMediaRunner::from_env() {
        deps = deps.with_media(Arc::new(media));
    } else {
        warn!("Media commands not configured; pipeline jobs will be discarded");
    }

    let deps = Arc::new(deps);

    let mut registry = JobRegistry::new();
    if let Err(e) = jobs::register_all(&mut registry) {
        error!("Failed to register jobs: {e}");
        std::process::exit(1);
    }
    let registry = Arc::new(registry);

    let queue = Arc::new(JobQueue::new(Arc::clone(&registry)));
    deps.attach_queue(Arc::clone(&queue));

    let executor = Arc::new(JobExecutor::new(
        registry,
        Arc::clone(&queue),
        Arc::clone(&deps),
        jobs::pool_config(&config),
    ));

    let scheduler = PeriodicScheduler::new(Arc::clone(&queue), jobs::periodic_jobs(&config));
    let scheduler_handle = tokio::spawn(scheduler.run(executor.shutdown_receiver()));

    // Setup signal handler
    {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            executor.shutdown();
        });
    }

    executor.run().await;
    scheduler_handle.await.ok();

    info!("Worker shutdown complete");
}
