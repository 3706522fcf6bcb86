//! End-to-end tests over the SQLite-backed notebook facade.

use std::path::Path;
use std::time::Duration;

use domain::category::{CreateCategory, RenameCategory};
use domain::note::CreateNote;
use domain::todo::{CompleteTodo, CreateTodo};
use notebook::{Config, Notebook};
use projections::{QueryService, TodoSearch};

fn config_in(dir: &Path, sync_interval: Duration) -> Config {
    Config {
        events_db: format!("sqlite://{}", dir.join("events.db").display()),
        projections_db: format!("sqlite://{}", dir.join("projections.db").display()),
        cache_ttl: Duration::from_secs(60),
        sync_interval,
        ..Config::default()
    }
}

#[tokio::test]
async fn commands_are_readable_immediately_and_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), Duration::ZERO);

    let (category_id, todo_id) = {
        let notebook = Notebook::open(&config).await.unwrap();
        assert!(notebook.queries().tree.get_all().await.unwrap().is_empty());

        let create = CreateCategory::new("Projects", None);
        let category_id = create.category_id;
        notebook.send(create.into()).await.unwrap();
        notebook
            .send(CreateNote::new("todo.txt", Some(category_id)).into())
            .await
            .unwrap();
        notebook
            .send(RenameCategory::new(category_id, "Work").into())
            .await
            .unwrap();
        let todo = CreateTodo::new("Buy milk");
        let todo_id = todo.todo_id;
        notebook.send(todo.into()).await.unwrap();
        notebook
            .send(CompleteTodo::new(todo_id).into())
            .await
            .unwrap();

        let root = notebook
            .queries()
            .tree
            .get_by_id(category_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.name, "Work");

        notebook.close().await.unwrap();
        (category_id, todo_id)
    };

    let notebook = Notebook::open(&config).await.unwrap();
    let children = notebook
        .queries()
        .tree
        .get_children_of(Some(category_id))
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "todo.txt");

    let done = notebook
        .queries()
        .todos
        .search(&TodoSearch {
            completed: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].todo_id, todo_id);

    let statuses = notebook.orchestrator().status().await.unwrap();
    assert!(statuses.iter().all(|s| s.lag == 0));
    notebook.close().await.unwrap();
}

#[tokio::test]
async fn lost_projection_database_is_rebuilt_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), Duration::ZERO);

    let note_id = {
        let notebook = Notebook::open(&config).await.unwrap();
        let create = CreateNote::new("keep.md", None);
        let note_id = create.note_id;
        notebook.send(create.into()).await.unwrap();
        notebook.close().await.unwrap();
        note_id
    };

    std::fs::remove_file(dir.path().join("projections.db")).unwrap();
    for leftover in ["projections.db-wal", "projections.db-shm"] {
        let _ = std::fs::remove_file(dir.path().join(leftover));
    }

    let notebook = Notebook::open(&config).await.unwrap();
    let node = notebook.queries().tree.get_by_id(note_id).await.unwrap();
    assert_eq!(node.map(|n| n.name), Some("keep.md".to_string()));
    assert!(
        notebook
            .orchestrator()
            .verify_consistency()
            .await
            .unwrap()
            .is_consistent()
    );
    notebook.close().await.unwrap();
}

#[tokio::test]
async fn background_loop_repairs_writes_that_bypassed_sync() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), Duration::from_millis(10));
    let notebook = Notebook::open(&config).await.unwrap();

    let create = CreateNote::new("direct.md", None);
    let note_id = create.note_id;
    notebook
        .commands()
        .notes()
        .create_note(create)
        .await
        .unwrap();

    let mut seen = false;
    for _ in 0..300 {
        if notebook
            .queries()
            .tree
            .get_by_id(note_id)
            .await
            .unwrap()
            .is_some()
        {
            seen = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(seen, "background catch-up never reached the note");

    notebook.close().await.unwrap();
}
