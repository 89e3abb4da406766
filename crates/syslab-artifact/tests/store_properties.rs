//! Store-level guarantees exercised through the public API.
//!
//! - URI round-trip: anything `build` produces, `parse` takes back apart.
//! - Traversal: no adversarial path resolves outside its kind directory.
//! - Catalog completeness: every written artifact is listed exactly once
//!   and every listed URI resolves to an existing file.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use syslab_artifact::{ArtifactUri, Store, StoreError};
use tempfile::TempDir;

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.-]{1,12}".prop_filter("no dot segments", |s| s != "." && s != "..")
}

proptest! {
    #[test]
    fn prop_build_parse_round_trip(
        kind in "[a-z]{1,8}",
        segments in proptest::collection::vec(segment(), 0..6),
    ) {
        let built = ArtifactUri::build(kind.clone(), &segments);
        let parsed = ArtifactUri::parse(&built.to_string()).unwrap();
        prop_assert_eq!(parsed.kind(), kind.as_str());
        prop_assert_eq!(parsed.relative_path(), segments.join("/"));
        prop_assert_eq!(parsed, built);
    }

    #[test]
    fn prop_resolve_stays_inside_kind(
        segments in proptest::collection::vec(
            prop_oneof![segment(), Just("..".to_string()), Just(".".to_string())],
            0..8,
        ),
    ) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let uri = ArtifactUri::build("runs", &segments);
        match store.resolve(&uri) {
            Ok(path) => prop_assert!(path.starts_with(dir.path().join("runs"))),
            Err(err) => prop_assert!(matches!(err, StoreError::PathEscape(_))),
        }
    }
}

#[test]
fn concrete_scenario() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());

    let uri: ArtifactUri = "syslab://runs/abc/metrics.json".parse().unwrap();
    store.write_json(&uri, &json!({"final": 42})).unwrap();

    let listed: Vec<String> = store.catalog().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(listed, vec!["syslab://runs/abc/metrics.json"]);

    let bytes = store.read_bytes("runs", "abc/metrics.json").unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({"final": 42}));
}

#[test]
fn traversal_never_writes_outside_root() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("store"));

    let err = store
        .write_bytes(&"syslab://runs/../../escaped.txt".parse().unwrap(), b"x")
        .unwrap_err();
    assert!(matches!(err, StoreError::PathEscape(_)));
    assert!(!dir.path().join("escaped.txt").exists());
}

#[test]
fn catalog_is_complete_across_kinds() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    store.ensure().unwrap();

    let written: BTreeSet<ArtifactUri> = [
        "syslab://runs/r1/series.json",
        "syslab://runs/r1/metrics.json",
        "syslab://runs/r2/deep/nested/file.json",
        "syslab://opt/0123456789abcdef/solution.json",
        "syslab://traces/0123456789abcdef/trace.json",
        "syslab://viz/exports/report.html",
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect();

    for (i, uri) in written.iter().enumerate() {
        store.write_json(uri, &json!({ "i": i })).unwrap();
    }

    let listed = store.catalog().unwrap();
    assert_eq!(listed.len(), written.len());

    let listed_set: BTreeSet<ArtifactUri> = listed.into_iter().collect();
    assert_eq!(listed_set, written);

    for uri in &listed_set {
        let reparsed = ArtifactUri::parse(&uri.to_string()).unwrap();
        assert!(store.resolve(&reparsed).unwrap().is_file());
    }
}

#[test]
fn catalog_ignores_unregistered_directories() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    store.ensure().unwrap();
    std::fs::create_dir_all(dir.path().join("other")).unwrap();
    std::fs::write(dir.path().join("other").join("stray.json"), b"{}").unwrap();
    std::fs::write(dir.path().join("top.json"), b"{}").unwrap();

    assert!(store.catalog().unwrap().is_empty());
}

#[test]
fn ensure_twice_leaves_content_alone() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path());
    store.ensure().unwrap();
    let uri: ArtifactUri = "syslab://opt/j/solution.json".parse().unwrap();
    store.write_bytes(&uri, b"kept").unwrap();
    store.ensure().unwrap();
    assert_eq!(store.read_uri(&uri).unwrap(), b"kept");
}
