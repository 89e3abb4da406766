//! Read-only store resources exposed to callers

use crate::error::LabError;
use serde::{Deserialize, Serialize};
use syslab_artifact::{ArtifactUri, Store};

/// URI of the catalog resource
pub const CATALOG_URI: &str = "syslab://catalog";

/// Listing of every stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Artifact URIs, unordered
    pub artifacts: Vec<ArtifactUri>,
}

/// Build the catalog resource
///
/// # Errors
/// Returns error if the store cannot be walked
pub fn catalog(store: &Store) -> Result<Catalog, LabError> {
    Ok(Catalog {
        artifacts: store.catalog()?,
    })
}

/// Bytes of the artifact named by `uri`
///
/// [`CATALOG_URI`] reads as the pretty-printed [`Catalog`].
///
/// # Errors
/// Malformed URI, unknown kind, traversal or missing artifact
pub fn read_resource(store: &Store, uri: &str) -> Result<Vec<u8>, LabError> {
    if uri == CATALOG_URI {
        return Ok(serde_json::to_vec_pretty(&catalog(store)?)?);
    }
    let uri = ArtifactUri::parse(uri)?;
    Ok(store.read_uri(&uri)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use syslab_artifact::StoreError;

    #[test]
    fn catalog_serializes_as_artifact_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store
            .write_json(&"syslab://viz/a.json".parse().unwrap(), &json!(1))
            .unwrap();
        let value = serde_json::to_value(catalog(&store).unwrap()).unwrap();
        assert_eq!(value, json!({"artifacts": ["syslab://viz/a.json"]}));
    }

    #[test]
    fn read_resource_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::new(dir.path());
        assert!(matches!(
            read_resource(&store, "nope"),
            Err(LabError::Store(StoreError::Uri(_)))
        ));
        assert!(matches!(
            read_resource(&store, "syslab://runs/missing.json"),
            Err(LabError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn catalog_uri_reads_the_listing() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store
            .write_json(&"syslab://opt/j/solution.json".parse().unwrap(), &json!({}))
            .unwrap();
        let bytes = read_resource(&store, CATALOG_URI).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"artifacts": ["syslab://opt/j/solution.json"]}));
    }
}
