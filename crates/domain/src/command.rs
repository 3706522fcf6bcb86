//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{EventEnvelope, EventStore, Position, Version};

use crate::aggregate::{Aggregate, Changeset, DomainEvent};
use crate::error::DomainError;
use crate::serializer::EventSerializer;

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,

    /// Global position of the last persisted event.
    pub last_position: Position,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;
}

/// How many times a command is attempted when it keeps losing optimistic
/// concurrency races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` attempts in total (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Fail on the first conflict.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Handler for executing commands against aggregates.
///
/// The handler is stateless between commands: every command reloads the
/// aggregate from its stream, decides, appends, and drops it again.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    serializer: EventSerializer,
    retry: RetryPolicy,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
    DomainError: From<A::Error>,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S, serializer: EventSerializer) -> Self {
        Self {
            store,
            serializer,
            retry: RetryPolicy::default(),
            _phantom: PhantomData,
        }
    }

    /// Replaces the conflict retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Loads an aggregate from the event store.
    ///
    /// If the aggregate doesn't exist, returns a default instance.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let envelopes = self.store.load_events(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in &envelopes {
            let recorded = self.serializer.decode(envelope)?;
            let event_type = recorded.event_type();
            let event = A::Event::from_notebook(recorded.event).ok_or(
                DomainError::ForeignEvent {
                    aggregate_type: A::aggregate_type(),
                    aggregate_id,
                    event_type,
                },
            )?;
            aggregate = aggregate.apply(&event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Loads an aggregate that must exist.
    pub async fn load_required(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        self.load_existing(aggregate_id)
            .await?
            .ok_or(DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id,
            })
    }

    /// Persists a brand-new aggregate built by its factory.
    pub async fn create(&self, changeset: Changeset<A>) -> Result<CommandResult<A>, DomainError> {
        let aggregate_id = changeset
            .aggregate()
            .id()
            .ok_or(DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id: AggregateId::default(),
            })?;
        self.commit(aggregate_id, changeset).await
    }

    /// Appends the changeset's pending events, expecting the stream to still
    /// be at the version the changeset was started from.
    ///
    /// A stale changeset fails with the store's `ConcurrencyConflict`; nothing
    /// is retried here.
    pub async fn commit(
        &self,
        aggregate_id: AggregateId,
        changeset: Changeset<A>,
    ) -> Result<CommandResult<A>, DomainError> {
        let (aggregate, expected_version, events) = changeset.into_parts();

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events,
                new_version: expected_version,
                last_position: Position::start(),
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, expected_version, &events)?;
        let appended = self
            .store
            .append(aggregate_id, expected_version, envelopes)
            .await?;

        tracing::debug!(
            %aggregate_id,
            aggregate_type = A::aggregate_type(),
            version = %appended.version,
            position = %appended.last_position,
            "events committed"
        );

        Ok(CommandResult {
            aggregate,
            events,
            new_version: appended.version,
            last_position: appended.last_position,
        })
    }

    /// Executes a command against an existing aggregate and persists the
    /// single event it decides.
    ///
    /// On a concurrency conflict the aggregate is reloaded and the decision
    /// re-run, up to the retry policy's limit.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        decide: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<A::Event, A::Error>,
    {
        let mut attempt = 1;
        loop {
            let aggregate = self.load_required(aggregate_id).await?;
            let mut changeset = Changeset::for_existing(aggregate);
            changeset.record(&decide)?;

            match self.commit(aggregate_id, changeset).await {
                Err(DomainError::EventStore(e)) if e.is_conflict() => {
                    if attempt >= self.retry.max_attempts() {
                        tracing::warn!(%aggregate_id, attempts = attempt, "giving up after repeated conflicts");
                        return Err(DomainError::ConcurrencyConflict {
                            aggregate_id,
                            attempts: attempt,
                        });
                    }
                    metrics::counter!("command_conflict_retries_total").increment(1);
                    tracing::debug!(%aggregate_id, attempt, "concurrency conflict, reloading");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload_raw(self.serializer.encode(event)?)
                .build()?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
