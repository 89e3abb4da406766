//! Systems Lab artifact layer
//!
//! File-backed storage for tool outputs, addressed by `syslab://` URIs.
//!
//! # Core Concepts
//!
//! - [`ArtifactUri`]: `syslab://kind/relative/path` address value
//! - [`Store`]: maps kinds to directories, persists and lists artifacts
//! - [`ContentHash`]: SHA-256 digest over bytes or canonical JSON
//! - [`JobId`]: 16-hex-char content-derived identity used as a path segment
//!
//! # Example
//!
//! ```rust,ignore
//! use syslab_artifact::{ArtifactUri, Store};
//!
//! let store = Store::new("/var/lib/syslab");
//! store.ensure()?;
//!
//! let uri = ArtifactUri::build("runs", ["abc", "metrics.json"]);
//! store.write_json(&uri, &serde_json::json!({"final": 42}))?;
//! assert_eq!(store.catalog()?, vec![uri]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod hash;
mod job;
mod kind;
mod store;
mod uri;

pub use hash::{canonical_json, ContentHash, HashError, SHORT_HEX_LEN};
pub use job::{compute_job_id, JobId, JobIdError, JobRequest};
pub use kind::ArtifactKind;
pub use store::{Store, StoreError};
pub use uri::{ArtifactUri, UriError, SCHEME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
