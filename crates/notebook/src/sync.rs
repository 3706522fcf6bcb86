//! Keeps the read side in step with every accepted command.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{CommandBus, CommandOutcome, DomainError, NotebookCommand};
use event_store::EventStore;
use projections::{ProjectionOrchestrator, QueryServices};

/// Command bus decorator that runs a catch-up and drops the query caches
/// after each successful command, so the caller reads its own write.
///
/// A failed sync is logged as a `ProjectionSyncFailure` and never turns the
/// accepted command into an error; the background loop or the next command
/// repairs the lag. A rejected command skips the sync.
pub struct SyncBehavior<B, S: EventStore> {
    inner: B,
    orchestrator: Arc<ProjectionOrchestrator<S>>,
    queries: Arc<QueryServices>,
}

impl<B: CommandBus, S: EventStore> SyncBehavior<B, S> {
    pub fn new(
        inner: B,
        orchestrator: Arc<ProjectionOrchestrator<S>>,
        queries: Arc<QueryServices>,
    ) -> Self {
        Self {
            inner,
            orchestrator,
            queries,
        }
    }

    /// The undecorated bus.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn sync(&self, outcome: &CommandOutcome) {
        match self.orchestrator.catch_up().await {
            Ok(report) => {
                if report.head < outcome.last_position {
                    tracing::debug!(
                        head = %report.head,
                        written = %outcome.last_position,
                        "catch-up stopped before the command's events"
                    );
                }
            }
            Err(error) => {
                tracing::error!(
                    kind = "ProjectionSyncFailure",
                    stream_id = %outcome.stream_id,
                    position = %outcome.last_position,
                    %error,
                    "projection sync failed after a committed command"
                );
                metrics::counter!("projection_sync_failures_total").increment(1);
            }
        }
        // Partial batches may have landed even when the pass failed.
        self.queries.invalidate_all().await;
    }
}

#[async_trait]
impl<B, S> CommandBus for SyncBehavior<B, S>
where
    B: CommandBus,
    S: EventStore,
{
    #[tracing::instrument(skip(self, command), fields(command = command.name()))]
    async fn send(&self, command: NotebookCommand) -> Result<CommandOutcome, DomainError> {
        let outcome = self.inner.send(command).await?;
        self.sync(&outcome).await;
        Ok(outcome)
    }
}
