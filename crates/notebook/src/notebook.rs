//! The assembled notebook: stores, command path, read side, background sync.

use std::sync::Arc;

use domain::{
    CommandBus, CommandOutcome, DomainError, EventSerializer, NotebookCommand,
    NotebookCommandBus, RetryPolicy,
};
use event_store::SqliteEventStore;
use projections::{
    CatchUpReport, ProjectionOrchestrator, QueryServices, SharedProjectionStore,
    SqliteProjectionStore,
};

use crate::background::BackgroundCatchUp;
use crate::config::Config;
use crate::error::Result;
use crate::sync::SyncBehavior;

type SyncedBus = SyncBehavior<NotebookCommandBus<SqliteEventStore>, SqliteEventStore>;

/// A notebook backed by two SQLite databases: the event log and the
/// projection tables.
///
/// Commands go through [`SyncBehavior`], so a successful `send` is visible to
/// the next query. Call [`Notebook::close`] to stop the background loop and
/// release both pools.
pub struct Notebook {
    events: SqliteEventStore,
    projections: SqliteProjectionStore,
    bus: SyncedBus,
    orchestrator: Arc<ProjectionOrchestrator<SqliteEventStore>>,
    queries: Arc<QueryServices>,
    background: Option<BackgroundCatchUp>,
}

impl Notebook {
    /// Connects both databases and runs migrations, without touching the
    /// projections.
    #[tracing::instrument(
        skip(config),
        fields(events_db = %config.events_db, projections_db = %config.projections_db)
    )]
    pub async fn connect(config: &Config) -> Result<Self> {
        let serializer = EventSerializer::standard()?;
        let events = SqliteEventStore::connect(&config.events_db).await?;
        let projections = SqliteProjectionStore::connect(&config.projections_db).await?;
        let rows: SharedProjectionStore = Arc::new(projections.clone());

        let orchestrator = Arc::new(
            ProjectionOrchestrator::with_standard_projections(
                events.clone(),
                serializer.clone(),
                rows.clone(),
            )
            .with_batch_size(config.batch_size),
        );
        let queries = Arc::new(QueryServices::new(rows, config.cache_ttl));
        let bus = SyncBehavior::new(
            NotebookCommandBus::with_retry_policy(
                events.clone(),
                serializer,
                RetryPolicy::new(config.command_retries),
            ),
            orchestrator.clone(),
            queries.clone(),
        );

        Ok(Self {
            events,
            projections,
            bus,
            orchestrator,
            queries,
            background: None,
        })
    }

    /// Connects, brings every projection up to the head of the log, and
    /// starts the background loop when the config enables it.
    pub async fn open(config: &Config) -> Result<Self> {
        let mut notebook = Self::connect(config).await?;
        let report = notebook.orchestrator.catch_up().await?;
        tracing::info!(
            events_applied = report.events_applied,
            head = %report.head,
            "notebook opened"
        );

        if config.background_sync_enabled() {
            notebook.background = Some(BackgroundCatchUp::spawn(
                notebook.orchestrator.clone(),
                notebook.queries.clone(),
                config.sync_interval,
                config.verify_every,
            ));
        }
        Ok(notebook)
    }

    pub async fn send(
        &self,
        command: NotebookCommand,
    ) -> std::result::Result<CommandOutcome, DomainError> {
        self.bus.send(command).await
    }

    pub fn commands(&self) -> &NotebookCommandBus<SqliteEventStore> {
        self.bus.inner()
    }

    pub fn queries(&self) -> &QueryServices {
        &self.queries
    }

    pub fn orchestrator(&self) -> &ProjectionOrchestrator<SqliteEventStore> {
        &self.orchestrator
    }

    pub fn event_store(&self) -> &SqliteEventStore {
        &self.events
    }

    /// Clears and replays every projection, then drops the query caches.
    pub async fn rebuild_all(&self) -> Result<CatchUpReport> {
        let report = self.orchestrator.rebuild_all().await?;
        self.queries.invalidate_all().await;
        Ok(report)
    }

    /// Stops the background loop and closes both databases.
    pub async fn close(mut self) -> Result<()> {
        if let Some(background) = self.background.take() {
            background.shutdown().await?;
        }
        self.events.close().await;
        self.projections.close().await;
        tracing::info!("notebook closed");
        Ok(())
    }
}
