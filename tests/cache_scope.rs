use blueprint_script::store::FnLoader;
use blueprint_script::{
    CacheObject, CacheStore, Document, ExecuteError, ExecuteWatcher, ExecutionContext,
    InMemoryStore, Logiclet, NodeDef, NodeFactory, NodeMeta, Script, Session, Store,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records the object id bound under `$bound` each time it runs.
struct Recorder {
    meta: NodeMeta,
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl Logiclet for Recorder {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn execute(
        &self,
        _root: &serde_json::Value,
        _current: &mut Document,
        ctx: &mut ExecutionContext,
        _watcher: Option<&dyn ExecuteWatcher>,
    ) -> Result<(), ExecuteError> {
        let bound = ctx.get::<Arc<CacheObject>>("$bound");
        self.seen
            .lock()
            .unwrap()
            .push(bound.map(|obj| obj.id().to_string()));
        Ok(())
    }
}

fn recording_factory() -> (NodeFactory, Arc<Mutex<Vec<Option<String>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut factory = NodeFactory::new();
    let sink = seen.clone();
    factory.register("record", move |meta| {
        Box::new(Recorder {
            meta,
            seen: sink.clone(),
        })
    });
    (factory, seen)
}

fn locate_def(id: &str) -> NodeDef {
    NodeDef::new("cache-locate")
        .with_prop("id", id)
        .with_prop("cid", "$bound")
        .with_child(NodeDef::new("record"))
}

fn context_with(store: Arc<CacheStore>) -> ExecutionContext {
    let mut ctx = ExecutionContext::new(Arc::new(Session::new()));
    ctx.set_binding("$cache", store);
    ctx
}

#[test]
fn end_to_end_binding_is_visible_only_to_children() {
    let store = InMemoryStore::<CacheObject>::new("objects");
    let obj_a = store.insert("42", CacheObject::new("42").with_field("label", "objA"));
    let (factory, seen) = recording_factory();
    let script = Script::build(&locate_def("42"), &factory).unwrap();
    let mut ctx = context_with(Arc::new(store));

    script
        .execute(&serde_json::Value::Null, &mut ctx, None)
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![Some("42".to_string())]);
    assert!(ctx.get_binding("$bound").is_none());
    assert_eq!(obj_a.get("label"), Some("objA"));
}

#[test]
fn interpolated_id_resolves_through_context() {
    let store = InMemoryStore::<CacheObject>::new("objects");
    store.insert("42", CacheObject::new("42"));
    let (factory, seen) = recording_factory();
    let script = Script::build(&locate_def("${name}"), &factory).unwrap();
    let mut ctx = context_with(Arc::new(store));
    ctx.set_binding("name", "42");

    script
        .execute(&serde_json::Value::Null, &mut ctx, None)
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![Some("42".to_string())]);
}

#[test]
fn binding_never_leaks_when_a_later_child_fails() {
    let store = InMemoryStore::<CacheObject>::new("objects");
    store.insert("42", CacheObject::new("42"));
    let (factory, seen) = recording_factory();
    let def = locate_def("42").with_child(NodeDef::new("throw").with_prop("msg", "bad ${name}"));
    let script = Script::build(&def, &factory).unwrap();
    let mut ctx = context_with(Arc::new(store));
    ctx.set_binding("name", "day");

    let err = script
        .execute(&serde_json::Value::Null, &mut ctx, None)
        .unwrap_err();
    assert_eq!(
        err,
        ExecuteError::Thrown {
            code: "core.e1004".into(),
            message: "bad day".into()
        }
    );
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(!ctx.contains("$bound"));
}

#[test]
fn nested_locates_unwind_in_order() {
    let store = InMemoryStore::<CacheObject>::new("objects");
    store.insert("outer", CacheObject::new("outer"));
    store.insert("inner", CacheObject::new("inner"));
    let (factory, seen) = recording_factory();
    let def = NodeDef::new("cache-locate")
        .with_prop("id", "outer")
        .with_prop("cid", "$bound")
        .with_child(
            NodeDef::new("cache-locate")
                .with_prop("id", "inner")
                .with_prop("cid", "$inner")
                .with_child(NodeDef::new("record")),
        )
        .with_child(NodeDef::new("record"));
    let script = Script::build(&def, &factory).unwrap();
    let mut ctx = context_with(Arc::new(store));

    script
        .execute(&serde_json::Value::Null, &mut ctx, None)
        .unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("outer".to_string()), Some("outer".to_string())]
    );
    assert!(!ctx.contains("$bound"));
    assert!(!ctx.contains("$inner"));
}

#[test]
fn cache_scope_requires_registered_store() {
    let script = Script::from_json_str(r#"{"tag": "cache", "props": {"id": "nowhere"}}"#).unwrap();
    let mut ctx = ExecutionContext::new(Arc::new(Session::new()));
    assert_eq!(
        script.execute(&serde_json::Value::Null, &mut ctx, None),
        Err(ExecuteError::StoreNotRegistered {
            id: "nowhere".into()
        })
    );
}

#[test]
fn cache_get_outside_locate_is_missing_binding() {
    let script =
        Script::from_json_str(r#"{"tag": "cache-get", "props": {"field": "name"}}"#).unwrap();
    let mut ctx = ExecutionContext::new(Arc::new(Session::new()));
    let err = script
        .execute(&serde_json::Value::Null, &mut ctx, None)
        .unwrap_err();
    assert_eq!(err.code(), "core.e1003");
}

#[test]
fn concurrent_invocations_share_one_materialization() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let store: Arc<InMemoryStore<CacheObject>> = Arc::new(InMemoryStore::with_loader(
        "lazy",
        FnLoader(move |key: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(10));
            Ok(Some(CacheObject::new(key).with_field("name", "shared")))
        }),
    ));
    let session = Arc::new(Session::new().with_store(store.clone()));
    let script = Script::from_json_str(
        r#"{"tag": "cache", "props": {"id": "lazy"}, "children": [
            {"tag": "cache-locate", "props": {"id": "${uid}"}, "children": [
                {"tag": "cache-get", "props": {"field": "name"}},
                {"tag": "output", "props": {"id": "name", "value": "${name}"}}
            ]}
        ]}"#,
    )
    .unwrap();

    let inputs: Vec<serde_json::Value> = (0..32).map(|_| serde_json::json!({"uid": "hot"})).collect();
    let results = script.execute_batch(&session, &inputs, None);

    assert!(results
        .iter()
        .all(|r| r.as_ref().map(|doc| doc["name"] == "shared").unwrap_or(false)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.materializations(), 1);
    assert!(store.load("hot", false).is_some());
}

#[test]
fn directory_backed_store_feeds_a_script() {
    use blueprint_script::store::DirectoryLoader;

    let dir = std::env::temp_dir().join(format!("blueprint_it_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("u7.json"), r#"{"name": "carol", "age": 31}"#).unwrap();

    let store: Arc<CacheStore> = Arc::new(InMemoryStore::<CacheObject>::with_loader(
        "files",
        DirectoryLoader::new(&dir),
    ));
    let session = Arc::new(Session::new().with_store(store));
    let script = Script::from_json_str(
        r#"{"tag": "cache", "props": {"id": "files"}, "children": [
            {"tag": "cache-locate", "props": {"id": "${uid}"}, "children": [
                {"tag": "cache-get", "props": {"field": "age"}},
                {"tag": "cache-get", "props": {"field": "nick", "dft": "none"}},
                {"tag": "output", "props": {"id": "summary", "value": "${age}/${nick}"}}
            ]}
        ]}"#,
    )
    .unwrap();

    let results = script.execute_batch(
        &session,
        &[serde_json::json!({"uid": "u7"}), serde_json::json!({"uid": "nobody"})],
        None,
    );
    assert_eq!(results[0].as_ref().unwrap()["summary"], "31/none");
    assert_eq!(results[1].as_ref().unwrap_err().code(), "clnt.e2007");

    let _ = std::fs::remove_dir_all(dir);
}
