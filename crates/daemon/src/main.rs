use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use workpool_core::{driver, open_store, Config, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        storage_path = %config.storage_path,
        lease_ttl_seconds = config.lease_ttl_seconds,
        heartbeat_ttl_seconds = config.heartbeat_ttl_seconds,
        cycle_interval_seconds = config.cycle_interval_seconds,
        "starting workpool daemon"
    );

    let pool = open_store(&config).await?;
    let scheduler = Arc::new(Scheduler::new(pool, config));

    let stop = CancellationToken::new();
    let handle = driver::spawn(scheduler, stop.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduling driver");
    stop.cancel();
    handle.await?;

    Ok(())
}
