//! Testing utilities for the Systems Lab workspace
//!
//! Shared fixtures for scratch stores.

#![allow(missing_docs)]

use serde_json::Value;
use std::collections::BTreeSet;
use std::ops::Deref;
use syslab_artifact::{ArtifactUri, Store};
use tempfile::TempDir;

/// A store rooted in a temporary directory, removed on drop
#[derive(Debug)]
pub struct TempStore {
    store: Store,
    _dir: TempDir,
}

impl Deref for TempStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

/// Fresh store with the default kinds, directories created
pub fn temp_store() -> TempStore {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("store"));
    store.ensure().unwrap();
    TempStore { store, _dir: dir }
}

/// Fresh store whose root has not been created yet
pub fn temp_store_unensured() -> TempStore {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("store"));
    TempStore { store, _dir: dir }
}

pub fn uri(s: &str) -> ArtifactUri {
    s.parse().unwrap()
}

pub fn read_json(store: &Store, uri: &ArtifactUri) -> Value {
    store.read_json(uri).unwrap()
}

/// Catalog as a set of URI strings
pub fn catalog_set(store: &Store) -> BTreeSet<String> {
    store
        .catalog()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}
