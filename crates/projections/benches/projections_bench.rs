use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use domain::note::{CreateNote, TagNote};
use domain::tag::CreateTag;
use domain::todo::{CompleteTodo, CreateTodo};
use domain::{CommandBus, EventSerializer, NotebookCommandBus};
use event_store::InMemoryEventStore;
use projections::{
    InMemoryProjectionStore, ProjectionOrchestrator, QueryService, QueryServices,
    SharedProjectionStore, TodoSearch,
};

fn serializer() -> EventSerializer {
    EventSerializer::standard().unwrap()
}

/// Writes N notes and N todos, each tagged or completed: 4N + 1 events.
async fn populate_store(store: &InMemoryEventStore, n: usize) {
    let bus = NotebookCommandBus::new(store.clone(), serializer());
    let tag = CreateTag::new("bench", None);
    let tag_id = tag.tag_id;
    bus.send(tag.into()).await.unwrap();

    for i in 0..n {
        let note = CreateNote::new(format!("note-{i}.md"), None);
        let note_id = note.note_id;
        bus.send(note.into()).await.unwrap();
        bus.send(TagNote::new(note_id, tag_id).into()).await.unwrap();

        let todo = CreateTodo::new(format!("task {i}")).with_priority((i % 4) as u8);
        let todo_id = todo.todo_id;
        bus.send(todo.into()).await.unwrap();
        bus.send(CompleteTodo::new(todo_id).into()).await.unwrap();
    }
}

fn fresh_orchestrator(store: &InMemoryEventStore) -> ProjectionOrchestrator<InMemoryEventStore> {
    ProjectionOrchestrator::with_standard_projections(
        store.clone(),
        serializer(),
        Arc::new(InMemoryProjectionStore::new()),
    )
}

fn bench_catch_up_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    rt.block_on(populate_store(&store, 100));

    c.bench_function("projections/catch_up_401_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                fresh_orchestrator(&store).catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    rt.block_on(populate_store(&store, 1000));

    c.bench_function("projections/catch_up_4001_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                fresh_orchestrator(&store).catch_up().await.unwrap();
            });
        });
    });
}

fn bench_idle_catch_up(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let orchestrator = fresh_orchestrator(&store);
    rt.block_on(async {
        populate_store(&store, 100).await;
        orchestrator.catch_up().await.unwrap();
    });

    c.bench_function("projections/catch_up_at_head", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator.catch_up().await.unwrap();
            });
        });
    });
}

fn bench_rebuild_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    rt.block_on(populate_store(&store, 100));
    let orchestrator = fresh_orchestrator(&store);

    c.bench_function("projections/rebuild_401_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator.rebuild_all().await.unwrap();
            });
        });
    });
}

fn bench_todo_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let rows: SharedProjectionStore = Arc::new(InMemoryProjectionStore::new());
    rt.block_on(async {
        populate_store(&store, 100).await;
        ProjectionOrchestrator::with_standard_projections(store.clone(), serializer(), rows.clone())
            .catch_up()
            .await
            .unwrap();
    });

    let cached = QueryServices::new(rows.clone(), Duration::from_secs(60));
    let uncached = QueryServices::new(rows, Duration::ZERO);
    let filter = TodoSearch {
        completed: Some(true),
        text_contains: Some("9".into()),
        ..Default::default()
    };

    c.bench_function("projections/todo_search_cached", |b| {
        b.iter(|| {
            rt.block_on(async {
                cached.todos.search(&filter).await.unwrap();
            });
        });
    });
    c.bench_function("projections/todo_search_uncached", |b| {
        b.iter(|| {
            rt.block_on(async {
                uncached.todos.search(&filter).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_catch_up_100,
    bench_catch_up_1000,
    bench_idle_catch_up,
    bench_rebuild_100,
    bench_todo_search,
);
criterion_main!(benches);
