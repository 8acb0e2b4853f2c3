//! Scheduled delta sync fan-out.
//!
//! On a fixed interval, enqueues one delta job per tenant with an
//! enabled sync configuration. Each enqueue is delayed by a random
//! sub-minute jitter so a tick does not hit the remote APIs, the lock
//! store, and the repository for every tenant at the same instant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

use crate::config::SyncConfigStore;
use crate::job::{ConflictPolicy, SyncJob};
use crate::queue::JobQueue;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often to fan out delta jobs.
    pub interval: Duration,
    /// Upper bound for the per-job enqueue jitter.
    pub max_jitter: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6 * 60 * 60),
            max_jitter: Duration::from_secs(55),
        }
    }
}

/// Periodic trigger that fans out scheduled delta syncs.
pub struct SyncScheduler {
    configs: Arc<dyn SyncConfigStore>,
    queue: Arc<dyn JobQueue>,
    config: SchedulerConfig,
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SyncScheduler {
    /// Create a new scheduler.
    #[must_use]
    pub fn new(
        configs: Arc<dyn SyncConfigStore>,
        queue: Arc<dyn JobQueue>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            configs,
            queue,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Run the scheduler loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "starting sync scheduler"
        );

        let mut ticker = interval(self.config.interval);
        // The first tick of a tokio interval fires immediately; consume
        // it so the first fan-out happens one interval after startup.
        ticker.tick().await;

        loop {
            if self.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if self.is_shutdown() {
                        break;
                    }
                    self.tick().await;
                }
                () = self.notify.notified() => {
                    break;
                }
            }
        }

        info!("sync scheduler stopped");
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        info!("scheduler shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
        self.notify.notify_waiters();
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Fan out one delta job per enabled configuration. Returns the
    /// number of jobs scheduled.
    pub async fn tick(&self) -> usize {
        let configs = match self.configs.list_enabled().await {
            Ok(configs) => configs,
            Err(error) => {
                error!(error = %error, "failed to list enabled sync configurations");
                return 0;
            }
        };

        debug!(tenants = configs.len(), "scheduling delta syncs");

        for entry in &configs {
            let job = SyncJob::delta(entry.tenant_id, entry.source, ConflictPolicy::NewestWins);
            let delay = self.jitter();
            let queue = Arc::clone(&self.queue);

            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if let Err(error) = queue.enqueue(job).await {
                    error!(error = %error, "failed to enqueue scheduled delta sync");
                }
            });
        }

        configs.len()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.config.max_jitter.as_millis();
        if max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(0..max_ms);
        Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}
