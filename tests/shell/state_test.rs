//! State buckets across sessions backed by a JSON state file.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;
use termshell::commands::handlers::builtin_registry;
use termshell::commands::CommandExecutor;
use termshell::context::{BufferWriter, ExecutionContext, LineKind};
use termshell::state::{JsonFileStore, KeyValueStore, StateManager};

use pretty_assertions::assert_eq;

struct Session {
    executor: CommandExecutor,
    ctx: ExecutionContext,
    out: BufferWriter,
}

impl Session {
    async fn open(path: &Path) -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(path).await.unwrap());
        let out = BufferWriter::new();
        let mut ctx = ExecutionContext::new(Arc::new(out.clone()), StateManager::new(kv));
        let executor = CommandExecutor::new(builtin_registry().unwrap());
        executor.boot(&mut ctx).await.unwrap();
        Self { executor, ctx, out }
    }

    async fn run(&mut self, line: &str) -> i32 {
        self.executor.execute_command(line, &mut self.ctx).await
    }
}

#[tokio::test]
async fn test_aliases_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut first = Session::open(&path).await;
        assert_eq!(first.run("alias set hi echo hello again").await, 0);
    }

    let mut second = Session::open(&path).await;
    assert_eq!(second.run("hi").await, 0);
    assert_eq!(second.out.lines_of(LineKind::Plain), vec!["hello again"]);

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        on_disk,
        json!({ "termshell:state:alias": { "aliases": { "hi": "echo hello again" } } })
    );
}

#[tokio::test]
async fn test_corrupted_state_file_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut session = Session::open(&path).await;
    assert!(dir.path().join("state.json.bak").exists());

    session.run("alias").await;
    assert_eq!(
        session.out.lines_of(LineKind::Info),
        vec!["No aliases defined"]
    );
}

#[tokio::test]
async fn test_unpersisted_changes_are_lost() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut session = Session::open(&path).await;
        let store = session
            .ctx
            .states_mut()
            .get_state_store("notes", json!({ "items": [] }));
        store.update_state(json!({ "items": ["kept"] }));
        store.persist().await.unwrap();
        store.update_state(json!({ "items": ["dropped"] }));
        session.run("echo done").await;
    }

    let mut session = Session::open(&path).await;
    let store = session
        .ctx
        .states_mut()
        .get_state_store("notes", json!({ "items": [] }));
    assert_eq!(store.get_state(), json!({ "items": [] }));

    store.initialize().await.unwrap();
    assert_eq!(store.get("items"), Some(json!(["kept"])));
}

#[tokio::test]
async fn test_subscription_sees_hydrate_and_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).await.unwrap());
    kv.set("termshell:state:counter", json!({ "count": 5, "label": "x" }))
        .await
        .unwrap();

    let mut states = StateManager::new(kv);
    let store = states.get_state_store("counter", json!({ "count": 0 }));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.select(
        |state| state["count"].clone(),
        move |count| sink.lock().unwrap().push(count.clone()),
    );

    store.initialize().await.unwrap();
    store.update_state(json!({ "label": "y" }));
    store.reset();
    drop(subscription);
    store.update_state(json!({ "count": 9 }));

    assert_eq!(*seen.lock().unwrap(), vec![json!(5), json!(0)]);
    assert_eq!(store.subscriber_count(), 0);
}
