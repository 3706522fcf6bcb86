//! Periodic catch-up that repairs missed syncs.

use std::sync::Arc;
use std::time::Duration;

use event_store::EventStore;
use projections::{ProjectionOrchestrator, QueryServices};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

/// Owned background task running catch-up on a fixed interval.
///
/// Every `verify_every` ticks it also runs the consistency check (0 turns
/// the check off). Dropping the handle also ends the loop at its next
/// wake-up, but only [`BackgroundCatchUp::shutdown`] waits for it.
pub struct BackgroundCatchUp {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackgroundCatchUp {
    pub fn spawn<S: EventStore + 'static>(
        orchestrator: Arc<ProjectionOrchestrator<S>>,
        queries: Arc<QueryServices>,
        interval: Duration,
        verify_every: u32,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let cancel_rx = shutdown_rx.clone();
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            tracing::info!(interval_ms = period.as_millis() as u64, "background catch-up started");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        ticks += 1;
                        reconcile(&orchestrator, &queries, &cancel_rx).await;
                        if verify_every > 0 && ticks % u64::from(verify_every) == 0 {
                            verify(&orchestrator).await;
                        }
                    }
                }
            }

            tracing::info!(ticks, "background catch-up stopped");
        });

        Self { shutdown, handle }
    }

    /// Signals the loop and waits for the task to finish.
    ///
    /// A background pass in flight ends after its current batch. Passes
    /// started by anyone else run to completion.
    pub async fn shutdown(self) -> Result<()> {
        // The receiver only disappears when the task already ended.
        let _ = self.shutdown.send(true);
        self.handle.await?;
        Ok(())
    }
}

async fn reconcile<S: EventStore>(
    orchestrator: &ProjectionOrchestrator<S>,
    queries: &QueryServices,
    shutdown: &watch::Receiver<bool>,
) {
    match orchestrator.catch_up_until(&|| *shutdown.borrow()).await {
        Ok(report) => {
            if report.events_applied > 0 {
                tracing::debug!(
                    events_applied = report.events_applied,
                    "background catch-up applied missed events"
                );
                queries.invalidate_all().await;
            }
        }
        Err(error) => {
            tracing::warn!(%error, "background catch-up failed, retrying next tick");
        }
    }
}

async fn verify<S: EventStore>(orchestrator: &ProjectionOrchestrator<S>) {
    match orchestrator.verify_consistency().await {
        Ok(report) if report.is_consistent() => {
            tracing::debug!("projections consistent with the event log");
        }
        Ok(report) => {
            let diverged: Vec<&str> = report.diverged().collect();
            tracing::warn!(?diverged, "projections diverged, run a rebuild");
        }
        Err(error) => {
            tracing::warn!(%error, "consistency check failed");
        }
    }
}
