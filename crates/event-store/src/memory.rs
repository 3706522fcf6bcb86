use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Position, Result, Version,
    store::{AppendResult, EventStore, validate_batch},
};

/// In-memory event store implementation.
///
/// Events are kept in one vector in position order, so the index of an
/// event is `position - 1`. The write lock is the single-writer critical
/// section; readers take the read lock and therefore only ever see whole
/// batches.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event in position order.
    pub async fn all_events(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    /// Overwrites the payload of an already-appended event.
    ///
    /// Only meant for tests that need to simulate a corrupted log; nothing
    /// in the engine ever rewrites history.
    #[doc(hidden)]
    pub async fn corrupt_payload(&self, position: Position, payload: serde_json::Value) -> bool {
        let mut events = self.events.write().await;
        match events.get_mut(position.as_u64().saturating_sub(1) as usize) {
            Some(event) => {
                event.payload = payload;
                true
            }
            None => false,
        }
    }

    fn version_of(events: &[EventEnvelope], stream_id: AggregateId) -> Version {
        events
            .iter()
            .rev()
            .find(|e| e.aggregate_id == stream_id)
            .map(|e| e.version)
            .unwrap_or(Version::initial())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<AppendResult> {
        validate_batch(stream_id, expected_version, &events)?;

        let mut store = self.events.write().await;

        let actual = Self::version_of(&store, stream_id);
        if actual != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        let first_position = Position::new(store.len() as u64 + 1);
        let count = events.len() as u64;
        let mut position = Position::new(store.len() as u64);
        let mut version = expected_version;
        for mut event in events {
            position = position.next();
            version = event.version;
            event.position = position;
            store.push(event);
        }

        metrics::counter!("events_appended_total").increment(count);

        Ok(AppendResult {
            version,
            first_position,
            last_position: position,
        })
    }

    async fn load_events(&self, stream_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        // Position order within one stream is version order.
        Ok(store
            .iter()
            .filter(|e| e.aggregate_id == stream_id)
            .cloned()
            .collect())
    }

    async fn get_events_since(
        &self,
        after: Position,
        batch_size: usize,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let start = (after.as_u64() as usize).min(store.len());
        Ok(store[start..].iter().take(batch_size).cloned().collect())
    }

    async fn current_position(&self) -> Result<Position> {
        Ok(Position::new(self.events.read().await.len() as u64))
    }

    async fn stream_version(&self, stream_id: AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = Self::version_of(&store, stream_id);
        Ok((version > Version::initial()).then_some(version))
    }

    async fn event_count(&self) -> Result<u64> {
        Ok(self.events.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventStoreExt;

    fn create_test_event(stream_id: AggregateId, version: i64, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(stream_id)
            .aggregate_type("Note")
            .event_type(event_type)
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_single_event_assigns_position() {
        let store = InMemoryEventStore::new();
        let stream_id = AggregateId::new();
        let event = create_test_event(stream_id, 1, "NoteCreated");

        let result = store
            .append(stream_id, Version::initial(), vec![event])
            .await
            .unwrap();
        assert_eq!(result.version, Version::first());
        assert_eq!(result.first_position, Position::new(1));
        assert_eq!(result.last_position, Position::new(1));

        let events = store.load_events(stream_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].position, Position::new(1));
    }

    #[tokio::test]
    async fn append_multiple_events() {
        let store = InMemoryEventStore::new();
        let stream_id = AggregateId::new();

        let events = vec![
            create_test_event(stream_id, 1, "Event1"),
            create_test_event(stream_id, 2, "Event2"),
            create_test_event(stream_id, 3, "Event3"),
        ];

        let result = store
            .append(stream_id, Version::initial(), events)
            .await
            .unwrap();
        assert_eq!(result.version, Version::new(3));
        assert_eq!(result.last_position, Position::new(3));
        assert_eq!(store.current_position().await.unwrap(), Position::new(3));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts_and_writes_nothing() {
        let store = InMemoryEventStore::new();
        let stream_id = AggregateId::new();

        store
            .append(
                stream_id,
                Version::initial(),
                vec![create_test_event(stream_id, 1, "Event1")],
            )
            .await
            .unwrap();

        let result = store
            .append(
                stream_id,
                Version::initial(),
                vec![create_test_event(stream_id, 1, "Event1")],
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { actual, .. }) if actual == Version::first()
        ));
        assert_eq!(store.load_events(stream_id).await.unwrap().len(), 1);
        assert_eq!(store.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_events_since_is_strict_and_bounded() {
        let store = InMemoryEventStore::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        // Interleave two streams.
        for version in 1..=3 {
            store
                .append(
                    a,
                    Version::new(version - 1),
                    vec![create_test_event(a, version, "A")],
                )
                .await
                .unwrap();
            store
                .append(
                    b,
                    Version::new(version - 1),
                    vec![create_test_event(b, version, "B")],
                )
                .await
                .unwrap();
        }

        let batch = store.get_events_since(Position::new(2), 3).await.unwrap();
        let positions: Vec<u64> = batch.iter().map(|e| e.position.as_u64()).collect();
        assert_eq!(positions, vec![3, 4, 5]);

        let tail = store.get_events_since(Position::new(5), 10).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert!(
            store
                .get_events_since(Position::new(6), 10)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn stream_version_tracks_latest_event() {
        let store = InMemoryEventStore::new();
        let stream_id = AggregateId::new();

        assert!(store.stream_version(stream_id).await.unwrap().is_none());
        assert!(!store.stream_exists(stream_id).await.unwrap());

        let events = vec![
            create_test_event(stream_id, 1, "Event1"),
            create_test_event(stream_id, 2, "Event2"),
        ];
        store
            .append(stream_id, Version::initial(), events)
            .await
            .unwrap();

        assert_eq!(
            store.stream_version(stream_id).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn stream_all_events_pages_through_log() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        for _ in 0..5 {
            let id = AggregateId::new();
            store
                .append(
                    id,
                    Version::initial(),
                    vec![create_test_event(id, 1, "Event")],
                )
                .await
                .unwrap();
        }

        let stream = store.stream_all_events(2).await.unwrap();
        let events: Vec<_> = stream.collect().await;
        let positions: Vec<u64> = events
            .into_iter()
            .map(|e| e.unwrap().position.as_u64())
            .collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }
}
