//! Core aggregate and domain event traits.

use std::fmt::Debug;

use common::AggregateId;
use event_store::Version;
use serde::Serialize;

use crate::event::NotebookEvent;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense. Each aggregate has
/// one event family (a sum type); serializing a family value yields the
/// payload of the variant, while the variant itself travels as the event type.
pub trait DomainEvent: Serialize + Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Returns the registered event type name.
    fn event_type(&self) -> &'static str;

    /// Wraps the event into the notebook-wide event sum type.
    fn into_notebook(self) -> NotebookEvent;

    /// Unwraps a notebook event, if it belongs to this family.
    fn from_notebook(event: NotebookEvent) -> Option<Self>;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate is rebuilt by folding its own stream and decides new events
/// from commands. Those decisions live in inherent methods on each aggregate
/// (`&self -> Result<Event, Error>`); the pending events are held by a
/// [`Changeset`], never by the aggregate itself.
pub trait Aggregate: Default + Clone + Debug + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the aggregate type name.
    ///
    /// Stored with every event of the stream.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    ///
    /// Version starts at 0 for a new aggregate and increments with each event.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    fn set_version(&mut self, version: Version);

    /// Folds one event into the state.
    ///
    /// This must be pure, deterministic and total. It never rejects an event,
    /// even one that current validation would refuse as a new command.
    fn apply(self, event: &Self::Event) -> Self;

    /// Rebuilds an aggregate from its full stream, in version order.
    fn load_from_history<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        events.into_iter().fold(Self::default(), |state, event| {
            let version = state.version().next();
            let mut state = state.apply(event);
            state.set_version(version);
            state
        })
    }
}

/// An aggregate together with the events a command has decided but not yet
/// committed.
///
/// Recording an event folds it into the aggregate immediately, so a command
/// can decide several steps against up-to-date state. A rejected decision
/// leaves both the aggregate and the pending list untouched.
#[derive(Debug, Clone)]
pub struct Changeset<A: Aggregate> {
    aggregate: A,
    expected_version: Version,
    uncommitted: Vec<A::Event>,
}

impl<A: Aggregate> Changeset<A> {
    /// Starts a changeset over a loaded (or default) aggregate.
    pub fn for_existing(aggregate: A) -> Self {
        Self {
            expected_version: aggregate.version(),
            aggregate,
            uncommitted: Vec::new(),
        }
    }

    /// Starts a brand-new stream with its creation event.
    pub fn created(event: A::Event) -> Self {
        let mut changeset = Self::for_existing(A::default());
        changeset.push(event);
        changeset
    }

    /// Runs a decision against the current state and records its event.
    pub fn record<F>(&mut self, decide: F) -> Result<(), A::Error>
    where
        F: FnOnce(&A) -> Result<A::Event, A::Error>,
    {
        let event = decide(&self.aggregate)?;
        self.push(event);
        Ok(())
    }

    fn push(&mut self, event: A::Event) {
        let version = self.aggregate.version().next();
        let aggregate = std::mem::take(&mut self.aggregate);
        self.aggregate = aggregate.apply(&event);
        self.aggregate.set_version(version);
        self.uncommitted.push(event);
    }

    /// The aggregate with all pending events applied.
    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    /// The stream version the pending events must be appended after.
    pub fn expected_version(&self) -> Version {
        self.expected_version
    }

    /// Events decided but not yet committed.
    pub fn uncommitted(&self) -> &[A::Event] {
        &self.uncommitted
    }

    pub fn is_empty(&self) -> bool {
        self.uncommitted.is_empty()
    }

    pub fn into_parts(self) -> (A, Version, Vec<A::Event>) {
        (self.aggregate, self.expected_version, self.uncommitted)
    }
}
