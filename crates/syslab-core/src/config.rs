//! Process configuration
//!
//! Read once at startup through [`LabConfig::from_env`]; a missing store
//! directory is a startup failure, never a first-use surprise.

use crate::error::LabError;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use syslab_artifact::Store;

/// Environment variable naming the store root
pub const STORE_DIR_VAR: &str = "SYSLAB_STORE_DIR";

/// Startup configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabConfig {
    /// Root directory of the artifact store
    pub store_dir: PathBuf,
}

impl LabConfig {
    /// Configuration rooted at `store_dir`
    #[inline]
    #[must_use]
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    /// With a different store root
    #[inline]
    #[must_use]
    pub fn with_store_dir(mut self, store_dir: impl Into<PathBuf>) -> Self {
        self.store_dir = store_dir.into();
        self
    }

    /// Load from the process environment
    ///
    /// # Errors
    /// [`ConfigError::Missing`] if `SYSLAB_STORE_DIR` is unset or empty,
    /// [`ConfigError::Invalid`] if it is not valid UTF-8.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var_os(key))
    }

    /// Load through an arbitrary variable lookup
    ///
    /// # Errors
    /// As [`from_env`](Self::from_env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let raw = lookup(STORE_DIR_VAR).ok_or(ConfigError::Missing(STORE_DIR_VAR))?;
        let value = raw.into_string().map_err(|_| ConfigError::Invalid {
            var: STORE_DIR_VAR,
            reason: "not valid UTF-8".to_string(),
        })?;
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(STORE_DIR_VAR));
        }
        Ok(Self::new(value))
    }

    /// Store root
    #[inline]
    #[must_use]
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Build the store and create its directories
    ///
    /// # Errors
    /// Returns error if the directories cannot be created
    pub fn open_store(&self) -> Result<Store, LabError> {
        let store = Store::new(&self.store_dir);
        store.ensure()?;
        tracing::info!(root = %self.store_dir.display(), "artifact store opened");
        Ok(store)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required variable not set
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// Variable set to an unusable value
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_with(value: Option<&str>) -> impl Fn(&str) -> Option<OsString> + '_ {
        move |key| {
            assert_eq!(key, STORE_DIR_VAR);
            value.map(OsString::from)
        }
    }

    #[test]
    fn loads_store_dir() {
        let config = LabConfig::from_lookup(lookup_with(Some("/tmp/syslab"))).unwrap();
        assert_eq!(config.store_dir(), Path::new("/tmp/syslab"));
    }

    #[test]
    fn missing_is_an_error() {
        let err = LabConfig::from_lookup(lookup_with(None)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_DIR_VAR));
        assert_eq!(
            err.to_string(),
            "SYSLAB_STORE_DIR environment variable is required"
        );
    }

    #[test]
    fn empty_is_missing() {
        let err = LabConfig::from_lookup(lookup_with(Some("  "))).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_DIR_VAR));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_is_invalid() {
        use std::os::unix::ffi::OsStringExt;
        let err = LabConfig::from_lookup(|_| Some(OsString::from_vec(vec![0xff, 0xfe]))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn open_store_creates_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = LabConfig::new("unused").with_store_dir(dir.path().join("s"));
        let store = config.open_store().unwrap();
        assert!(store.root().join("runs").is_dir());
        assert!(store.root().join("viz").is_dir());
    }
}
