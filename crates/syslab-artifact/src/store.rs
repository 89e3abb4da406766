//! File-backed artifact store
//!
//! Every artifact lives at `<root>/<kind>/<relative path>`. The store owns
//! the kind → directory mapping and is the only place URIs are turned into
//! filesystem paths, so traversal checks happen here and nowhere else.
//!
//! The store holds no in-process state besides its configuration; writes
//! to distinct URIs are independent, writes to the same URI are
//! last-writer-wins.

use crate::kind::ArtifactKind;
use crate::uri::{ArtifactUri, UriError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File-backed artifact store
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    kinds: IndexMap<String, PathBuf>,
}

impl Store {
    /// Store with the built-in kinds (`runs`, `opt`, `traces`, `viz`)
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let kinds = ArtifactKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), root.join(kind.as_str())))
            .collect();
        Self { root, kinds }
    }

    /// Store with a custom closed set of kinds
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidKind`] if a kind is not a single plain
    /// path segment.
    pub fn with_kinds<I, S>(root: impl Into<PathBuf>, kinds: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = root.into();
        let mut map = IndexMap::new();
        for kind in kinds {
            let kind = kind.into();
            if !is_plain_segment(&kind) {
                return Err(StoreError::InvalidKind(kind));
            }
            let dir = root.join(&kind);
            map.insert(kind, dir);
        }
        Ok(Self { root, kinds: map })
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and every kind directory
    ///
    /// Idempotent: existing directories are left untouched.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if a directory cannot be created
    pub fn ensure(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        for dir in self.kinds.values() {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        tracing::debug!(root = %self.root.display(), kinds = self.kinds.len(), "store directories ready");
        Ok(())
    }

    /// Map a URI to its filesystem path
    ///
    /// The relative path is normalized lexically: `.` and empty segments
    /// are skipped and `..` removes the previous segment. A `..` that would
    /// leave the kind directory is rejected, as are segments containing a
    /// backslash or NUL.
    ///
    /// # Errors
    /// - [`StoreError::UnknownKind`] if the kind is not registered
    /// - [`StoreError::PathEscape`] if the path leaves the kind directory
    pub fn resolve(&self, uri: &ArtifactUri) -> Result<PathBuf, StoreError> {
        let base = self
            .kinds
            .get(uri.kind())
            .ok_or_else(|| StoreError::UnknownKind(uri.kind().to_string()))?;

        let mut path = base.clone();
        for seg in normalize(uri)? {
            path.push(seg);
        }
        Ok(path)
    }

    /// Persist a value as pretty-printed JSON, overwriting
    ///
    /// # Errors
    /// Resolution errors, [`StoreError::Json`] if the value cannot be
    /// encoded, [`StoreError::Io`] on write failure.
    pub fn write_json<T>(&self, uri: &ArtifactUri, value: &T) -> Result<ArtifactUri, StoreError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(uri, e))?;
        self.write_bytes(uri, &bytes)
    }

    /// Persist raw bytes, creating parent directories and overwriting
    ///
    /// Returns the URI unchanged on success.
    ///
    /// # Errors
    /// Resolution errors, [`StoreError::NotAFile`] for a kind root,
    /// [`StoreError::Io`] on write failure.
    pub fn write_bytes(&self, uri: &ArtifactUri, bytes: &[u8]) -> Result<ArtifactUri, StoreError> {
        let path = self.resolve(uri)?;
        let parent = match path.parent() {
            Some(parent) if self.kinds.get(uri.kind()) != Some(&path) => parent,
            _ => return Err(StoreError::NotAFile(uri.to_string())),
        };
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        fs::write(&path, bytes).map_err(|e| StoreError::io(&path, e))?;
        tracing::debug!(uri = %uri, bytes = bytes.len(), "wrote artifact");
        Ok(uri.clone())
    }

    /// Read an artifact by kind and relative path
    ///
    /// # Errors
    /// - [`StoreError::UnknownKind`] if the kind is not registered
    /// - [`StoreError::PathEscape`] if the path leaves the kind directory
    /// - [`StoreError::NotFound`] if no file exists there
    pub fn read_bytes(&self, kind: &str, relative_path: &str) -> Result<Vec<u8>, StoreError> {
        self.read_uri(&ArtifactUri::build(kind, [relative_path]))
    }

    /// Read an artifact by URI
    ///
    /// # Errors
    /// As [`read_bytes`](Self::read_bytes)
    pub fn read_uri(&self, uri: &ArtifactUri) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(uri)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(uri.to_string()));
        }
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(uri.to_string()),
            _ => StoreError::io(&path, e),
        })
    }

    /// Read and decode a JSON artifact
    ///
    /// # Errors
    /// As [`read_uri`](Self::read_uri), plus [`StoreError::Json`] if the
    /// bytes do not decode into `T`.
    pub fn read_json<T: DeserializeOwned>(&self, uri: &ArtifactUri) -> Result<T, StoreError> {
        let bytes = self.read_uri(uri)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::json(uri, e))
    }

    /// List every stored artifact
    ///
    /// URIs are rebuilt from each file's path below its kind directory.
    /// Only regular files are listed; symlinks are not followed. Order is
    /// unspecified.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if a directory cannot be walked
    pub fn catalog(&self) -> Result<Vec<ArtifactUri>, StoreError> {
        let mut items = Vec::new();
        for (kind, base) in &self.kinds {
            if !base.is_dir() {
                continue;
            }
            for entry in WalkDir::new(base).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(base).to_path_buf();
                    StoreError::io(&path, io::Error::other(e))
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(base) else {
                    continue;
                };
                let parts: Option<Vec<&str>> = rel
                    .components()
                    .map(|c| c.as_os_str().to_str())
                    .collect();
                match parts {
                    Some(parts) => items.push(ArtifactUri::build(kind.as_str(), parts)),
                    None => {
                        tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 artifact path");
                    }
                }
            }
        }
        tracing::trace!(count = items.len(), "catalog built");
        Ok(items)
    }
}

fn normalize(uri: &ArtifactUri) -> Result<Vec<&str>, StoreError> {
    let mut out: Vec<&str> = Vec::with_capacity(uri.segments().len());
    for seg in uri.segments() {
        match seg.as_str() {
            "" | "." => {}
            ".." => {
                if out.pop().is_none() {
                    tracing::warn!(uri = %uri, "rejected path escaping kind root");
                    return Err(StoreError::PathEscape(uri.to_string()));
                }
            }
            s if s.contains(['\\', '\0']) => {
                tracing::warn!(uri = %uri, "rejected path segment");
                return Err(StoreError::PathEscape(uri.to_string()));
            }
            s => out.push(s),
        }
    }
    Ok(out)
}

fn is_plain_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\', '\0'])
}

/// Errors raised by [`Store`] operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// URI string could not be parsed
    #[error(transparent)]
    Uri(#[from] UriError),

    /// Kind is not registered with this store
    #[error("unknown artifact kind '{0}'")]
    UnknownKind(String),

    /// Kind name is not a plain path segment
    #[error("invalid artifact kind name '{0}'")]
    InvalidKind(String),

    /// Path would leave the kind directory
    #[error("path escapes its kind directory: {0}")]
    PathEscape(String),

    /// Nothing stored at this address
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Address names a directory, not a file
    #[error("not a file address: {0}")]
    NotAFile(String),

    /// Filesystem failure
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON encode/decode failure
    #[error("JSON error for {uri}: {source}")]
    Json {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(uri: &ArtifactUri, source: serde_json::Error) -> Self {
        Self::Json {
            uri: uri.to_string(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than the
    /// environment
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("store"));
        (dir, store)
    }

    fn uri(s: &str) -> ArtifactUri {
        s.parse().unwrap()
    }

    #[test]
    fn ensure_creates_kind_dirs_and_is_idempotent() {
        let (_dir, store) = fresh();
        store.ensure().unwrap();
        store.ensure().unwrap();
        for kind in ["runs", "opt", "traces", "viz"] {
            assert!(store.root().join(kind).is_dir());
        }
        let count = fs::read_dir(store.root()).unwrap().count();
        assert_eq!(count, 4);
    }

    #[test]
    fn resolve_maps_under_kind_dir() {
        let (_dir, store) = fresh();
        let path = store.resolve(&uri("syslab://runs/abc/metrics.json")).unwrap();
        assert_eq!(path, store.root().join("runs").join("abc").join("metrics.json"));
    }

    #[test]
    fn resolve_unknown_kind() {
        let (_dir, store) = fresh();
        let err = store.resolve(&uri("syslab://secrets/x")).unwrap_err();
        assert!(matches!(err, StoreError::UnknownKind(k) if k == "secrets"));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let (_dir, store) = fresh();
        let err = store.resolve(&uri("syslab://runs/../../etc/passwd")).unwrap_err();
        assert!(matches!(err, StoreError::PathEscape(_)));
        let err = store.resolve(&uri("syslab://runs/a/../../opt/x")).unwrap_err();
        assert!(matches!(err, StoreError::PathEscape(_)));
    }

    #[test]
    fn resolve_allows_inner_dot_dot() {
        let (_dir, store) = fresh();
        let path = store.resolve(&uri("syslab://runs/a/./../b.json")).unwrap();
        assert_eq!(path, store.root().join("runs").join("b.json"));
    }

    #[test]
    fn resolve_rejects_backslash() {
        let (_dir, store) = fresh();
        let err = store.resolve(&uri("syslab://runs/..\\..\\x")).unwrap_err();
        assert!(matches!(err, StoreError::PathEscape(_)));
    }

    #[test]
    fn write_json_then_read_back() {
        let (_dir, store) = fresh();
        let target = uri("syslab://runs/abc/metrics.json");
        let written = store.write_json(&target, &json!({"final": 42})).unwrap();
        assert_eq!(written, target);

        let bytes = store.read_bytes("runs", "abc/metrics.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"final": 42}));
    }

    #[test]
    fn write_overwrites() {
        let (_dir, store) = fresh();
        let target = uri("syslab://viz/a.txt");
        store.write_bytes(&target, b"first").unwrap();
        store.write_bytes(&target, b"second").unwrap();
        assert_eq!(store.read_uri(&target).unwrap(), b"second");
    }

    #[test]
    fn write_to_kind_root_is_rejected() {
        let (_dir, store) = fresh();
        let err = store.write_bytes(&uri("syslab://runs"), b"x").unwrap_err();
        assert!(matches!(err, StoreError::NotAFile(_)));
        let err = store.write_bytes(&uri("syslab://runs/a/.."), b"x").unwrap_err();
        assert!(matches!(err, StoreError::NotAFile(_)));
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_dir, store) = fresh();
        store.ensure().unwrap();
        let err = store.read_bytes("runs", "nope.json").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = store.read_bytes("runs", "").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn read_unknown_kind() {
        let (_dir, store) = fresh();
        let err = store.read_bytes("nope", "x").unwrap_err();
        assert!(matches!(err, StoreError::UnknownKind(_)));
    }

    #[test]
    fn read_json_reports_decode_errors() {
        let (_dir, store) = fresh();
        let target = uri("syslab://runs/bad.json");
        store.write_bytes(&target, b"not json").unwrap();
        let err = store.read_json::<serde_json::Value>(&target).unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[test]
    fn catalog_lists_single_artifact() {
        let (_dir, store) = fresh();
        store
            .write_json(&uri("syslab://runs/abc/metrics.json"), &json!({"final": 42}))
            .unwrap();
        let listed: Vec<String> = store.catalog().unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(listed, vec!["syslab://runs/abc/metrics.json".to_string()]);
    }

    #[test]
    fn catalog_on_missing_root_is_empty() {
        let (_dir, store) = fresh();
        assert!(store.catalog().unwrap().is_empty());
    }

    #[test]
    fn custom_kinds() {
        let dir = TempDir::new().unwrap();
        let store = Store::with_kinds(dir.path(), ["reports"]).unwrap();
        assert!(store.resolve(&uri("syslab://reports/a.json")).is_ok());
        assert!(matches!(
            store.resolve(&uri("syslab://runs/a.json")),
            Err(StoreError::UnknownKind(_))
        ));
        assert!(matches!(
            Store::with_kinds(dir.path(), ["a/b"]),
            Err(StoreError::InvalidKind(_))
        ));
        assert!(matches!(
            Store::with_kinds(dir.path(), [".."]),
            Err(StoreError::InvalidKind(_))
        ));
    }

    #[test]
    fn client_error_classification() {
        assert!(StoreError::NotFound("x".into()).is_client_error());
        assert!(!StoreError::io(Path::new("/x"), io::Error::other("disk")).is_client_error());
    }
}
