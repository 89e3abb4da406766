//! `syslab://` artifact addresses
//!
//! Provides [`ArtifactUri`], the value type used to name every persisted
//! artifact. A URI is a kind plus an ordered list of path segments:
//!
//! - `syslab://runs` → kind `runs`, no segments
//! - `syslab://runs/abc/metrics.json` → kind `runs`, segments `["abc", "metrics.json"]`
//!
//! Parsing never checks whether the kind is registered; that is the
//! [`Store`](crate::Store)'s job.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Fixed URI scheme
pub const SCHEME: &str = "syslab";

const SEPARATOR: &str = "://";

/// Address of an artifact
///
/// Immutable once built. Equality, ordering and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactUri {
    kind: String,
    segments: Vec<String>,
}

impl ArtifactUri {
    /// Build a URI from a kind and any number of path parts
    ///
    /// Each part has leading/trailing `/` stripped and empty parts are
    /// dropped. A part with inner `/` contributes several segments, so
    /// `build("runs", ["a/b", "c"])` renders as `syslab://runs/a/b/c`.
    #[must_use]
    pub fn build<I, S>(kind: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = parts
            .into_iter()
            .flat_map(|part| split_segments(part.as_ref()))
            .collect();
        Self {
            kind: kind.into(),
            segments,
        }
    }

    /// Parse a URI string
    ///
    /// The remainder after `syslab://` is split on the first `/` into kind
    /// and relative path. Without a `/` the relative path is empty.
    ///
    /// # Errors
    /// Returns [`UriError::Malformed`] if the scheme does not match or the
    /// kind is empty.
    pub fn parse(uri: &str) -> Result<Self, UriError> {
        let (scheme, rest) = uri
            .split_once(SEPARATOR)
            .ok_or_else(|| UriError::malformed(uri, "missing scheme separator"))?;
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return Err(UriError::malformed(
                uri,
                format!("unsupported scheme '{scheme}'"),
            ));
        }

        let (kind, rel) = rest.split_once('/').unwrap_or((rest, ""));
        if kind.is_empty() {
            return Err(UriError::malformed(uri, "empty kind"));
        }

        Ok(Self {
            kind: kind.to_string(),
            segments: split_segments(rel),
        })
    }

    /// Artifact kind (first path component)
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Path segments below the kind
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relative path below the kind, `/`-joined
    #[inline]
    #[must_use]
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Last segment, if any
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a path part, returning a new URI
    #[must_use]
    pub fn join(&self, part: impl AsRef<str>) -> Self {
        let mut new = self.clone();
        new.segments.extend(split_segments(part.as_ref()));
        new
    }
}

fn split_segments(part: &str) -> Vec<String> {
    part.split('/')
        .filter(|seg| !seg.is_empty())
        .map(str::to_string)
        .collect()
}

impl Display for ArtifactUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{SEPARATOR}{}", self.kind)?;
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ArtifactUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ArtifactUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced while parsing URIs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// Not a `syslab://` URI
    #[error("malformed URI '{uri}': {reason}")]
    Malformed { uri: String, reason: String },
}

impl UriError {
    fn malformed(uri: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}
