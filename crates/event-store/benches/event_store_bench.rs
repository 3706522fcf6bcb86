use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    EventEnvelope, EventStoreExt, InMemoryEventStore, Position, SqliteEventStore, Version,
    store::EventStore,
};

fn make_event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type("Note")
        .event_type("NoteRenamed")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "title": format!("draft-{version}.md")
        }))
        .build()
        .unwrap()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                store
                    .append(agg_id, Version::initial(), vec![make_event(agg_id, 1)])
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let events: Vec<EventEnvelope> = (1..=10).map(|v| make_event(agg_id, v)).collect();
                store
                    .append(agg_id, Version::initial(), events)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_sqlite_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(SqliteEventStore::in_memory()).unwrap();

    c.bench_function("event_store/sqlite_append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let agg_id = AggregateId::new();
                store
                    .append(agg_id, Version::initial(), vec![make_event(agg_id, 1)])
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_load_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let agg_id = AggregateId::new();

    // Pre-populate with 100 events
    rt.block_on(async {
        let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
        store
            .append(agg_id, Version::initial(), events)
            .await
            .unwrap();
    });

    c.bench_function("event_store/load_events_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.load_events(agg_id).await.unwrap();
            });
        });
    });
}

fn bench_get_events_since(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = rt.block_on(SqliteEventStore::in_memory()).unwrap();

    // Pre-populate with 1000 events across 10 streams
    rt.block_on(async {
        for _ in 0..10 {
            let agg_id = AggregateId::new();
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
            store
                .append(agg_id, Version::initial(), events)
                .await
                .unwrap();
        }
    });

    c.bench_function("event_store/sqlite_get_events_since_batch_500", |b| {
        b.iter(|| {
            rt.block_on(async {
                let batch = store
                    .get_events_since(Position::new(250), 500)
                    .await
                    .unwrap();
                assert_eq!(batch.len(), 500);
            });
        });
    });
}

fn bench_stream_all_events(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    // Pre-populate with 1000 events across 10 streams
    rt.block_on(async {
        for _ in 0..10 {
            let agg_id = AggregateId::new();
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
            store
                .append(agg_id, Version::initial(), events)
                .await
                .unwrap();
        }
    });

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = store.stream_all_events(500).await.unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_sqlite_append,
    bench_load_events,
    bench_get_events_since,
    bench_stream_all_events,
);
criterion_main!(benches);
