//! Scheduled background jobs
//!
//! The daily job has no maintenance work of its own yet; it checks that the
//! store is reachable and logs the result.

use afl_core::Store;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Run `job` every `interval`, starting one interval after the call.
///
/// Failures are logged and the schedule continues. Abort the returned
/// handle to stop it.
pub fn spawn_daily<F, Fut, E>(name: &'static str, interval: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            tracing::info!(job = name, "Running scheduled job");

            match job().await {
                Ok(()) => tracing::info!(job = name, "Scheduled job finished"),
                Err(e) => tracing::error!(job = name, error = %e, "Scheduled job failed"),
            }
        }
    })
}

/// Daily maintenance pass
pub async fn daily_maintenance(store: Arc<dyn Store>) -> afl_core::Result<()> {
    store.health_check().await?;
    tracing::info!(store = store.backend_name(), "Daily maintenance: store reachable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use afl_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_each_interval_not_at_start() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = spawn_daily("count", Duration::from_secs(60), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_schedule() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let handle = spawn_daily("flaky", Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("store unreachable")
            }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_daily_maintenance_on_memory_store() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        daily_maintenance(store).await.unwrap();
    }
}
