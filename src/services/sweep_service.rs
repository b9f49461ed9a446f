use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::attempt_service::AttemptService;

/// Background worker that turns client-driven expiry into a server-owned
/// guarantee: any attempt whose deadline has passed is force-finalized over
/// the answers already persisted, whether or not the client ever calls back.
pub struct ExpirySweeper {
    attempt_service: Arc<AttemptService>,
    interval_seconds: u64,
    grace_seconds: i64,
    worker_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl ExpirySweeper {
    pub fn new(
        attempt_service: Arc<AttemptService>,
        interval_seconds: u64,
        grace_seconds: i64,
    ) -> Self {
        Self {
            attempt_service,
            interval_seconds,
            grace_seconds,
            worker_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start the sweep loop. Call once at application startup.
    pub async fn start(&self) {
        let service = Arc::clone(&self.attempt_service);
        let interval = self.interval_seconds.max(1);
        let grace = self.grace_seconds;

        let handle = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(tokio::time::Duration::from_secs(interval));
            loop {
                ticker.tick().await;
                match service.sweep_expired(grace).await {
                    Ok(0) => {}
                    Ok(closed) => log::info!("Expiry sweep closed {} attempt(s)", closed),
                    Err(e) => log::warn!("Expiry sweep failed: {}", e),
                }
            }
        });

        let mut worker = self.worker_handle.write().await;
        *worker = Some(handle);

        log::info!(
            "Expiry sweeper started (every {}s, {}s grace)",
            interval,
            grace
        );
    }

    pub async fn stop(&self) {
        let mut worker = self.worker_handle.write().await;
        if let Some(handle) = worker.take() {
            handle.abort();
        }
    }
}
