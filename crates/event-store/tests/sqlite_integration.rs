//! SQLite integration tests
//!
//! Each test opens its own database, either in memory or in a temporary
//! directory, so they can run in parallel.
//!
//! ```bash
//! cargo test -p event-store --test sqlite_integration
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, EventEnvelope, EventStore, EventStoreError, EventStoreExt, Position,
    SqliteEventStore, Version,
};
use tempfile::TempDir;

async fn get_test_store() -> SqliteEventStore {
    SqliteEventStore::in_memory().await.unwrap()
}

async fn get_file_store(dir: &TempDir) -> SqliteEventStore {
    let url = format!("sqlite://{}", dir.path().join("events.db").display());
    SqliteEventStore::connect(&url).await.unwrap()
}

fn create_test_event(aggregate_id: AggregateId, version: Version, event_type: &str) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Category")
        .event_type(event_type)
        .version(version)
        .payload_raw(serde_json::json!({"name": "Work"}))
        .build()
        .unwrap()
}

#[tokio::test]
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let event = create_test_event(aggregate_id, Version::first(), "CategoryCreated");
    let result = store
        .append(aggregate_id, Version::initial(), vec![event.clone()])
        .await
        .unwrap();
    assert_eq!(result.version, Version::first());

    let events = store.load_events(aggregate_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].event_type, "CategoryCreated");
    assert_eq!(events[0].payload, event.payload);
    assert_eq!(events[0].timestamp, event.timestamp);
    assert!(events[0].is_appended());
}

#[tokio::test]
async fn append_multiple_events_atomically() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        create_test_event(aggregate_id, Version::new(1), "CategoryCreated"),
        create_test_event(aggregate_id, Version::new(2), "CategoryRenamed"),
        create_test_event(aggregate_id, Version::new(3), "CategoryMoved"),
    ];

    let result = store
        .append(aggregate_id, Version::initial(), events)
        .await
        .unwrap();
    assert_eq!(result.version, Version::new(3));
    assert_eq!(
        result.last_position.distance_from(result.first_position),
        2
    );

    let stored = store.load_events(aggregate_id).await.unwrap();
    let versions: Vec<i64> = stored.iter().map(|e| e.version.as_i64()).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn optimistic_concurrency_conflict() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            aggregate_id,
            Version::initial(),
            vec![create_test_event(aggregate_id, Version::first(), "CategoryCreated")],
        )
        .await
        .unwrap();

    let result = store
        .append(
            aggregate_id,
            Version::initial(),
            vec![create_test_event(aggregate_id, Version::first(), "CategoryCreated")],
        )
        .await;

    let err = result.unwrap_err();
    assert!(err.is_conflict());
    assert!(matches!(
        err,
        EventStoreError::ConcurrencyConflict { actual, .. } if actual == Version::first()
    ));
}

#[tokio::test]
async fn optimistic_concurrency_success() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            aggregate_id,
            Version::initial(),
            vec![create_test_event(aggregate_id, Version::first(), "CategoryCreated")],
        )
        .await
        .unwrap();

    store
        .append(
            aggregate_id,
            Version::first(),
            vec![create_test_event(aggregate_id, Version::new(2), "CategoryRenamed")],
        )
        .await
        .unwrap();

    let version = store.stream_version(aggregate_id).await.unwrap();
    assert_eq!(version, Some(Version::new(2)));
}

#[tokio::test]
async fn invalid_batches_are_rejected_before_writing() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let gap = store
        .append(
            aggregate_id,
            Version::initial(),
            vec![create_test_event(aggregate_id, Version::new(2), "CategoryCreated")],
        )
        .await;
    assert!(matches!(gap, Err(EventStoreError::InvalidAppend(_))));

    let empty = store.append(aggregate_id, Version::initial(), vec![]).await;
    assert!(matches!(empty, Err(EventStoreError::InvalidAppend(_))));

    assert_eq!(store.event_count().await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_appends_to_one_stream_admit_exactly_one() {
    let store = Arc::new(get_test_store().await);
    let aggregate_id = AggregateId::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .append(
                    aggregate_id,
                    Version::initial(),
                    vec![create_test_event(aggregate_id, Version::first(), "CategoryCreated")],
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(store.event_count().await.unwrap(), 1);
}

#[tokio::test]
async fn positions_are_gapless_under_concurrent_streams() {
    let store = Arc::new(get_test_store().await);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let id = AggregateId::new();
            store
                .append(
                    id,
                    Version::initial(),
                    vec![
                        create_test_event(id, Version::new(1), "CategoryCreated"),
                        create_test_event(id, Version::new(2), "CategoryRenamed"),
                    ],
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap();
        // Batches are never interleaved with other writers.
        assert_eq!(result.last_position.distance_from(result.first_position), 1);
    }

    let all = store.get_events_since(Position::start(), 1000).await.unwrap();
    let positions: Vec<u64> = all.iter().map(|e| e.position.as_u64()).collect();
    assert_eq!(positions, (1..=20).collect::<Vec<_>>());
}

#[tokio::test]
async fn get_events_since_pages_through_the_log() {
    let store = get_test_store().await;
    for _ in 0..5 {
        let id = AggregateId::new();
        store
            .append(
                id,
                Version::initial(),
                vec![create_test_event(id, Version::first(), "CategoryCreated")],
            )
            .await
            .unwrap();
    }

    let first = store.get_events_since(Position::start(), 2).await.unwrap();
    assert_eq!(first.len(), 2);
    let second = store
        .get_events_since(first[1].position, 2)
        .await
        .unwrap();
    assert_eq!(second[0].position, Position::new(3));
    let rest = store
        .get_events_since(Position::new(4), 100)
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert!(
        store
            .get_events_since(Position::new(5), 100)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn stream_all_events() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    for _ in 0..3 {
        let id = AggregateId::new();
        store
            .append(
                id,
                Version::initial(),
                vec![
                    create_test_event(id, Version::new(1), "CategoryCreated"),
                    create_test_event(id, Version::new(2), "CategoryDeleted"),
                ],
            )
            .await
            .unwrap();
    }

    let stream = store.stream_all_events(4).await.unwrap();
    let events: Vec<_> = stream.collect().await;
    assert_eq!(events.len(), 6);
    assert!(events.iter().all(|e| e.is_ok()));
}

#[tokio::test]
async fn stream_exists_extension() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    assert!(!store.stream_exists(aggregate_id).await.unwrap());

    store
        .append(
            aggregate_id,
            Version::initial(),
            vec![create_test_event(aggregate_id, Version::first(), "CategoryCreated")],
        )
        .await
        .unwrap();

    assert!(store.stream_exists(aggregate_id).await.unwrap());
}

#[tokio::test]
async fn file_database_keeps_positions_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = AggregateId::new();

    let store = get_file_store(&dir).await;
    store
        .append(
            id,
            Version::initial(),
            vec![create_test_event(id, Version::first(), "CategoryCreated")],
        )
        .await
        .unwrap();
    store.close().await;

    let store = get_file_store(&dir).await;
    let result = store
        .append(
            id,
            Version::first(),
            vec![create_test_event(id, Version::new(2), "CategoryRenamed")],
        )
        .await
        .unwrap();
    assert_eq!(result.first_position, Position::new(2));
    assert_eq!(store.stream_version(id).await.unwrap(), Some(Version::new(2)));
}
