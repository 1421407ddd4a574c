//! Declaration loader integration tests

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use recursive_schema::{Error, Limits, Loader, LookupError, Registry};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn load(names: &[&str]) -> Arc<Registry> {
    let loader = Loader::new();
    let mut registry = Registry::new();
    for name in names {
        loader.load_file(&mut registry, fixture(name)).unwrap();
    }
    Arc::new(registry)
}

#[test]
fn test_load_links() {
    let registry = load(&["links.json"]);
    let names: Vec<_> = registry.classes().map(|c| c.qualified_name()).collect();
    assert_eq!(names, vec!["app.links.LinkSerializer", "app.links.NodeSerializer"]);

    let link = registry.serializer("app.links.LinkSerializer").unwrap();
    let value = json!({"name": "a", "next": {"name": "b", "next": null}});
    assert_eq!(link.validate(&value).unwrap(), value);

    let node = registry.serializer("app.links.NodeSerializer").unwrap();
    let value = json!({"name": "root", "children": [{"name": "leaf", "children": []}]});
    assert_eq!(node.serialize(&value).unwrap(), value);
}

#[test]
fn test_load_across_documents() {
    let registry = load(&["links.json", "pingpong.json"]);

    let pong = registry.serializer("app.games.PongSerializer").unwrap();
    let value = json!({
        "pong_id": 2,
        "ping": {"ping_id": 1, "pong": {"pong_id": 0, "ping": {"ping_id": -1}}}
    });
    assert_eq!(pong.validate(&value).unwrap(), value);

    let silly = registry.serializer("app.games.SillySerializer").unwrap();
    let err = silly
        .validate(&json!({
            "name": "too long",
            "links": {"name": "x", "next": null}
        }))
        .unwrap_err();
    assert_eq!(
        err.detail().unwrap().messages_at("name"),
        vec!["Ensure this field has no more than 5 characters."]
    );
}

#[test]
fn test_missing_dependency_fails_on_use() {
    let registry = load(&["pingpong.json"]);
    let silly = registry.serializer("app.games.SillySerializer").unwrap();
    let err = silly
        .validate(&json!({"name": "ok", "links": {"name": "x", "next": null}}))
        .unwrap_err();
    match err {
        Error::SchemaNotFound { reference, source } => {
            assert_eq!(reference, "app.links.LinkSerializer");
            assert_eq!(source, LookupError::UnknownModule("app.links".to_string()));
        }
        other => panic!("expected SchemaNotFound, got {:?}", other),
    }
}

#[test]
fn test_load_model_backed_class() {
    let registry = load(&["models.json"]);
    let serializer = registry
        .serializer("app.models.RecursiveModelSerializer")
        .unwrap();
    let two = json!({
        "name": "two",
        "parent_id": 1,
        "parent": {"name": "one", "parent_id": null, "parent": null}
    });
    assert_eq!(
        serializer.serialize(&two).unwrap(),
        json!({"name": "two", "parent": {"name": "one", "parent": null}})
    );
}

#[test]
fn test_duplicate_document_is_rejected() {
    let loader = Loader::new();
    let mut registry = Registry::new();
    loader.load_file(&mut registry, fixture("links.json")).unwrap();
    let err = loader
        .load_file(&mut registry, fixture("links.json"))
        .unwrap_err();
    assert!(matches!(err, Error::Declaration(_)));
}

#[test]
fn test_document_size_limit() {
    let loader = Loader::new().with_limits(Limits {
        max_document_size: 16,
        ..Limits::default()
    });
    let mut registry = Registry::new();
    let err = loader
        .load_file(&mut registry, fixture("links.json"))
        .unwrap_err();
    assert!(matches!(err, Error::LimitExceeded(_)));
}

#[test]
fn test_missing_file() {
    let mut registry = Registry::new();
    let err = Loader::new()
        .load_file(&mut registry, fixture("does_not_exist.json"))
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
