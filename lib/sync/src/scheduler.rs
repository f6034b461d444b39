use crate::SyncDriver;
use lamden_indexer_storage_api::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

/// Fires the sync driver every `interval`, first shortly after startup.
/// At most one job instance runs at a time; a tick that finds the previous
/// job still running is skipped.
pub async fn run_scheduler<S: Store>(
    driver: Arc<SyncDriver<S>>,
    interval: Duration,
) -> anyhow::Result<()> {
    let running = Arc::new(Mutex::new(()));
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;

        let driver = driver.clone();
        let running = running.clone();
        tokio::spawn(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::debug!("previous sync job still running, skipping tick");
                return;
            };
            if let Err(err) = driver.tick().await {
                tracing::error!(?err, "sync job failed");
            }
        });
    }
}
