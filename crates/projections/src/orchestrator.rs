//! Feeds the event log into the projections.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use domain::EventSerializer;
use event_store::{EventStore, Position};
use tokio::sync::Mutex;

use crate::projection::Projection;
use crate::store::{InMemoryProjectionStore, SharedProjectionStore};
use crate::views::{TagProjection, TodoProjection, TreeViewProjection};
use crate::{ProjectionError, Result};

/// Asked between batches whether the caller wants its pass to end early.
pub type Cancelled<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// Events fetched from the log per round trip.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// What one catch-up pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchUpReport {
    /// Events read from the log, including skipped ones.
    pub events_read: u64,
    /// Deliveries to projections (one event can count once per projection).
    pub events_applied: u64,
    /// Events that could not be decoded.
    pub events_skipped: u64,
    pub batches: u64,
    /// Log head as last observed by the pass.
    pub head: Position,
    pub checkpoints: BTreeMap<&'static str, Position>,
    /// The caller got the result of a pass that ran while it waited.
    pub coalesced: bool,
    /// The pass was cut short by [`ProjectionOrchestrator::stop`].
    pub stopped: bool,
}

/// Where one projection stands relative to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionStatus {
    pub name: &'static str,
    pub checkpoint: Position,
    pub head: Position,
    pub lag: u64,
    pub row_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionHealth {
    pub status: ProjectionStatus,
    /// The rows equal a fresh replay of the log up to the checkpoint.
    pub rows_match: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub projections: Vec<ProjectionHealth>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.projections.iter().all(|p| p.rows_match)
    }

    pub fn diverged(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.projections
            .iter()
            .filter(|p| !p.rows_match)
            .map(|p| p.status.name)
    }
}

/// Runs catch-up, rebuild and consistency passes over a set of projections.
///
/// Every pass holds one lock, so at most one runs at a time. Callers that
/// queue behind a running pass are coalesced: if a pass that started after
/// they arrived has finished by the time they get the lock, they receive its
/// report instead of running another. A pass that ended early is never
/// shared this way.
pub struct ProjectionOrchestrator<S: EventStore> {
    store: S,
    serializer: EventSerializer,
    projections: Vec<Box<dyn Projection>>,
    batch_size: usize,
    last_pass: Mutex<Option<CatchUpReport>>,
    passes_started: AtomicU64,
    stop_requested: AtomicBool,
}

impl<S: EventStore> ProjectionOrchestrator<S> {
    /// Creates an orchestrator with no projections registered.
    pub fn new(store: S, serializer: EventSerializer) -> Self {
        Self {
            store,
            serializer,
            projections: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            last_pass: Mutex::new(None),
            passes_started: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Creates an orchestrator driving the tree, tag and todo views.
    pub fn with_standard_projections(
        store: S,
        serializer: EventSerializer,
        projection_store: SharedProjectionStore,
    ) -> Self {
        let mut orchestrator = Self::new(store, serializer);
        orchestrator.register(Box::new(TreeViewProjection::new(projection_store.clone())));
        orchestrator.register(Box::new(TagProjection::new(projection_store.clone())));
        orchestrator.register(Box::new(TodoProjection::new(projection_store)));
        orchestrator
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Registers a projection with this orchestrator.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_names(&self) -> Vec<&'static str> {
        self.projections.iter().map(|p| p.name()).collect()
    }

    pub fn event_store(&self) -> &S {
        &self.store
    }

    /// Asks a running pass to end after its current batch.
    ///
    /// Has no effect on a pass that has not started yet.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Brings every projection up to the head of the log.
    pub async fn catch_up(&self) -> Result<CatchUpReport> {
        self.catch_up_until(&|| false).await
    }

    /// Like [`Self::catch_up`], but ends the pass between batches once
    /// `cancelled` returns true.
    ///
    /// The condition belongs to this caller alone, unlike [`Self::stop`],
    /// which ends whichever pass happens to be running.
    #[tracing::instrument(skip_all)]
    pub async fn catch_up_until(&self, cancelled: Cancelled<'_>) -> Result<CatchUpReport> {
        let arrived_at = self.passes_started.load(Ordering::SeqCst);
        let mut last_pass = self.last_pass.lock().await;

        if self.passes_started.load(Ordering::SeqCst) > arrived_at
            && let Some(report) = last_pass.as_ref()
            && !report.stopped
        {
            tracing::debug!("coalesced with a pass that ran while waiting");
            metrics::counter!("projection_catch_up_coalesced_total").increment(1);
            return Ok(CatchUpReport {
                coalesced: true,
                ..report.clone()
            });
        }

        self.run_pass(&mut last_pass, cancelled).await
    }

    /// Clears every projection and replays the whole log.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<CatchUpReport> {
        let mut last_pass = self.last_pass.lock().await;
        for projection in &self.projections {
            projection.rebuild().await?;
            tracing::info!(projection = projection.name(), "projection cleared for rebuild");
        }
        self.run_pass(&mut last_pass, &|| false).await
    }

    /// Clears one projection and replays the log into it.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild(&self, name: &str) -> Result<CatchUpReport> {
        let mut last_pass = self.last_pass.lock().await;
        let projection = self
            .projections
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ProjectionError::UnknownProjection(name.to_string()))?;
        projection.rebuild().await?;
        tracing::info!(projection = name, "projection cleared for rebuild");
        self.run_pass(&mut last_pass, &|| false).await
    }

    /// Checkpoint, lag and row count of every projection.
    pub async fn status(&self) -> Result<Vec<ProjectionStatus>> {
        let head = self.store.current_position().await?;
        let mut statuses = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            statuses.push(Self::status_of(projection.as_ref(), head).await?);
        }
        Ok(statuses)
    }

    /// Replays the log into a scratch copy of every projection and compares
    /// the rows with the real ones.
    ///
    /// Each copy is replayed up to the real projection's checkpoint, so lag
    /// alone never counts as divergence.
    #[tracing::instrument(skip(self))]
    pub async fn verify_consistency(&self) -> Result<ConsistencyReport> {
        let _pass = self.last_pass.lock().await;
        let head = self.store.current_position().await?;

        let mut projections = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            let status = Self::status_of(projection.as_ref(), head).await?;
            let shadow = projection.shadow(Arc::new(InMemoryProjectionStore::new()));
            self.replay_into(shadow.as_ref(), status.checkpoint).await?;

            let rows_match = projection.snapshot_rows().await? == shadow.snapshot_rows().await?;
            if rows_match {
                tracing::debug!(projection = status.name, "projection consistent with log");
            } else {
                tracing::error!(
                    projection = status.name,
                    checkpoint = %status.checkpoint,
                    "projection rows diverge from a replay of the event log"
                );
                metrics::counter!("projection_divergence_total", "projection" => status.name)
                    .increment(1);
            }
            projections.push(ProjectionHealth { status, rows_match });
        }

        Ok(ConsistencyReport { projections })
    }

    async fn status_of(projection: &dyn Projection, head: Position) -> Result<ProjectionStatus> {
        let checkpoint = projection.checkpoint().await?;
        Ok(ProjectionStatus {
            name: projection.name(),
            checkpoint,
            head,
            lag: head.distance_from(checkpoint),
            row_count: projection.row_count().await?,
        })
    }

    async fn run_pass(
        &self,
        last_pass: &mut Option<CatchUpReport>,
        cancelled: Cancelled<'_>,
    ) -> Result<CatchUpReport> {
        self.passes_started.fetch_add(1, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
        *last_pass = None;

        let report = self.pass(cancelled).await?;
        if report.events_read > 0 {
            tracing::info!(
                events_read = report.events_read,
                events_applied = report.events_applied,
                events_skipped = report.events_skipped,
                head = %report.head,
                stopped = report.stopped,
                "catch-up complete"
            );
        }
        *last_pass = Some(report.clone());
        Ok(report)
    }

    async fn pass(&self, cancelled: Cancelled<'_>) -> Result<CatchUpReport> {
        let mut checkpoints = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            checkpoints.push(projection.checkpoint().await?);
        }

        let mut report = CatchUpReport::default();
        loop {
            report.head = self.store.current_position().await?;
            let Some(from) = checkpoints.iter().min().copied() else {
                break;
            };
            if report.head <= from {
                break;
            }
            if self.stop_requested.load(Ordering::SeqCst) || cancelled() {
                tracing::info!(checkpoint = %from, "catch-up stopped between batches");
                report.stopped = true;
                break;
            }

            let batch = self.store.get_events_since(from, self.batch_size).await?;
            let Some(last) = batch.last().map(|e| e.position) else {
                break;
            };
            report.batches += 1;

            for envelope in &batch {
                report.events_read += 1;
                let recorded = match self.serializer.decode(envelope) {
                    Ok(recorded) => recorded,
                    Err(error) => {
                        tracing::warn!(
                            position = %envelope.position,
                            event_type = %envelope.event_type,
                            %error,
                            "undecodable event skipped"
                        );
                        metrics::counter!("projection_events_skipped_total", "reason" => "decode")
                            .increment(1);
                        report.events_skipped += 1;
                        continue;
                    }
                };

                for (projection, checkpoint) in self.projections.iter().zip(&checkpoints) {
                    if *checkpoint < recorded.position
                        && projection.is_relevant(recorded.event_type())
                    {
                        projection.apply(&recorded).await?;
                        report.events_applied += 1;
                        metrics::counter!(
                            "projection_events_applied_total",
                            "projection" => projection.name()
                        )
                        .increment(1);
                    }
                }
            }

            for (projection, checkpoint) in self.projections.iter().zip(checkpoints.iter_mut()) {
                if *checkpoint < last {
                    projection.save_checkpoint(last).await?;
                    *checkpoint = last;
                    metrics::gauge!("projection_checkpoint", "projection" => projection.name())
                        .set(last.as_u64() as f64);
                }
            }
        }

        report.checkpoints = self
            .projections
            .iter()
            .map(|p| p.name())
            .zip(checkpoints)
            .collect();
        Ok(report)
    }

    async fn replay_into(&self, projection: &dyn Projection, until: Position) -> Result<()> {
        let mut after = Position::start();
        while after < until {
            let batch = self.store.get_events_since(after, self.batch_size).await?;
            let Some(last) = batch.last().map(|e| e.position) else {
                break;
            };
            for envelope in batch.iter().take_while(|e| e.position <= until) {
                let Ok(recorded) = self.serializer.decode(envelope) else {
                    continue;
                };
                if projection.is_relevant(recorded.event_type()) {
                    projection.apply(&recorded).await?;
                }
            }
            after = last;
        }
        Ok(())
    }
}
