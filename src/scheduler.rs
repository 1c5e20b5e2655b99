use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::core::poller::{CycleOutcome, Poller};
use crate::models::PollState;
use crate::plugins::templates;
use crate::plugins::traits::Notifier;

/// The single logical worker. Holding its lock is what makes a cycle in flight.
pub struct PollWorker {
    poller: Poller,
    state: PollState,
}

impl PollWorker {
    pub fn new(poller: Poller) -> Self {
        Self {
            poller,
            state: PollState::new(),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    async fn tick(&mut self, now: DateTime<Local>) -> CycleOutcome {
        let state = std::mem::take(&mut self.state);
        let (state, outcome) = self.poller.run_cycle(state, now).await;
        self.state = state;
        outcome
    }
}

/// Listens for Ctrl-C and, on Unix, SIGTERM (sent by `docker stop`, systemd
/// and Kubernetes).
///
/// Handlers are installed by [`register`](Self::register), so a signal that
/// arrives before `recv` is awaited is still seen.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    /// Resolves with the name of the first signal received.
    pub async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    }
                    "SIGINT"
                }
                _ = self.terminate.recv() => "SIGTERM",
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            "SIGINT"
        }
    }
}

pub struct InventoryScheduler {
    scheduler: JobScheduler,
    worker: Arc<Mutex<PollWorker>>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    shutdown_timeout: Duration,
    start_time: DateTime<Utc>,
}

impl InventoryScheduler {
    pub async fn new(
        poller: Poller,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        shutdown_timeout: Duration,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            worker: Arc::new(Mutex::new(PollWorker::new(poller))),
            notifier,
            interval,
            shutdown_timeout,
            start_time: Utc::now(),
        })
    }

    pub fn worker(&self) -> Arc<Mutex<PollWorker>> {
        Arc::clone(&self.worker)
    }

    /// Announce, register the repeating tick, then run the first cycle right away.
    pub async fn start(&mut self) -> Result<()> {
        self.notifier.dispatch(templates::started(self.interval)).await;

        let worker = Arc::clone(&self.worker);
        let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
            let worker = Arc::clone(&worker);
            Box::pin(async move {
                Self::execute_tick(worker).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        tracing::info!("Inventory scheduler started, polling every {:?}", self.interval);

        self.run_now().await;
        Ok(())
    }

    /// Run one cycle immediately, waiting for any in-flight cycle first.
    pub async fn run_now(&self) -> CycleOutcome {
        let mut worker = self.worker.lock().await;
        let outcome = worker.tick(Local::now()).await;
        tracing::debug!("Cycle finished: {:?}", outcome);
        outcome
    }

    /// Returns `None` when a cycle was already running and this tick was dropped.
    async fn execute_tick(worker: Arc<Mutex<PollWorker>>) -> Option<CycleOutcome> {
        let Ok(mut worker) = worker.try_lock() else {
            tracing::warn!("Previous cycle still running, skipping tick");
            metrics::counter!("watcher_ticks_overlapped_total").increment(1);
            return None;
        };

        let start_time = tokio::time::Instant::now();
        let outcome = worker.tick(Local::now()).await;
        tracing::debug!(
            "Cycle finished in {}ms: {:?}",
            start_time.elapsed().as_millis(),
            outcome
        );
        Some(outcome)
    }

    /// Wait (bounded) for the in-flight cycle, flush, say goodbye, then release
    /// the job scheduler.
    ///
    /// The worker stays locked until the scheduler is gone, so no tick can start
    /// after the final flush. Every step is attempted even if an earlier one fails.
    pub async fn shutdown(&mut self) {
        let worker = Arc::clone(&self.worker);
        let guard = match tokio::time::timeout(self.shutdown_timeout, worker.lock()).await {
            Ok(mut guard) => {
                if let Err(e) = guard.poller.flush().await {
                    tracing::error!("Failed to flush identifier store on shutdown: {}", e);
                }
                Some(guard)
            }
            Err(_) => {
                tracing::warn!(
                    "In-flight cycle did not finish within {:?}, skipping final flush",
                    self.shutdown_timeout
                );
                None
            }
        };

        self.notifier.dispatch(templates::stopped()).await;

        if let Err(e) = self.scheduler.shutdown().await {
            tracing::error!("Failed to stop job scheduler: {}", e);
        }
        drop(guard);

        let uptime = Utc::now().signed_duration_since(self.start_time);
        tracing::info!(
            "Inventory scheduler shutdown after {}s",
            uptime.num_seconds().max(0)
        );
    }
}
