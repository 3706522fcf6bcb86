use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::{TryStreamExt, stream};

use crate::{AggregateId, EventEnvelope, EventStoreError, Position, Result, Version};

/// Outcome of a successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendResult {
    /// Stream version after the batch.
    pub version: Version,

    /// Global position of the first event in the batch.
    pub first_position: Position,

    /// Global position of the last event in the batch.
    pub last_position: Position,
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Appends are
/// serialized by the implementation; reads never observe a partially
/// written batch.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to `stream_id`.
    ///
    /// The batch is persisted atomically, and only if the stream is currently
    /// at `expected_version`; otherwise `ConcurrencyConflict` is returned and
    /// nothing is written. Each event is assigned a new global position.
    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<AppendResult>;

    /// Retrieves all events of a stream in ascending version order.
    async fn load_events(&self, stream_id: AggregateId) -> Result<Vec<EventEnvelope>>;

    /// Retrieves at most `batch_size` events across all streams whose
    /// position is strictly greater than `after`, in ascending position order.
    async fn get_events_since(
        &self,
        after: Position,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>>;

    /// Returns the position of the latest event in the log (0 when empty).
    async fn current_position(&self) -> Result<Position>;

    /// Returns the current version of a stream, or None if it has no events.
    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>>;

    /// Returns the total number of events in the log.
    async fn event_count(&self) -> Result<u64>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Returns true if the stream has at least one event.
    async fn stream_exists(&self, stream_id: AggregateId) -> Result<bool> {
        Ok(self.stream_version(stream_id).await?.is_some())
    }

    /// Streams every event in position order, paging through the log in
    /// batches of `page_size`.
    async fn stream_all_events(&self, page_size: usize) -> Result<EventStream>
    where
        Self: Clone + Sized + 'static,
    {
        let store = self.clone();
        let page_size = page_size.max(1);

        let pages = stream::try_unfold(
            (store, Position::start(), false),
            move |(store, after, exhausted)| async move {
                if exhausted {
                    return Ok::<_, EventStoreError>(None);
                }
                let batch = store.get_events_since(after, page_size).await?;
                let next = batch.last().map(|e| e.position).unwrap_or(after);
                let exhausted = batch.len() < page_size;
                let page = stream::iter(batch.into_iter().map(Ok::<_, EventStoreError>));
                Ok(Some((page, (store, next, exhausted))))
            },
        );

        Ok(Box::pin(pages.try_flatten()))
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks a batch before it is handed to a backend.
///
/// The batch must be non-empty, belong entirely to `stream_id`, and carry
/// versions `expected_version + 1, + 2, ...` in order.
pub fn validate_batch(
    stream_id: AggregateId,
    expected_version: Version,
    events: &[EventEnvelope],
) -> Result<()> {
    if events.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "cannot append an empty batch".to_string(),
        ));
    }

    let aggregate_type = &events[0].aggregate_type;
    let mut version = expected_version;
    for event in events {
        if event.aggregate_id != stream_id {
            return Err(EventStoreError::InvalidAppend(format!(
                "event {} belongs to stream {}, not {}",
                event.event_id, event.aggregate_id, stream_id
            )));
        }
        if &event.aggregate_type != aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "all events in a batch must have the same aggregate type".to_string(),
            ));
        }
        version = version.next();
        if event.version != version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                version, event.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(stream_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(stream_id)
            .aggregate_type("Note")
            .event_type("NoteRenamed")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = validate_batch(AggregateId::new(), Version::initial(), &[]);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn batch_must_continue_from_expected_version() {
        let id = AggregateId::new();
        assert!(validate_batch(id, Version::new(2), &[event(id, 3), event(id, 4)]).is_ok());
        assert!(validate_batch(id, Version::new(2), &[event(id, 4)]).is_err());
        assert!(validate_batch(id, Version::new(2), &[event(id, 3), event(id, 5)]).is_err());
    }

    #[test]
    fn batch_must_target_a_single_stream() {
        let id = AggregateId::new();
        let other = AggregateId::new();
        let result = validate_batch(id, Version::initial(), &[event(id, 1), event(other, 2)]);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }
}
