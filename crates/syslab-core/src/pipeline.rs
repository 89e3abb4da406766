//! Conventions shared by every producer pipeline
//!
//! - [`TraceStep`] / [`Milestone`]: the fixed five-role step template
//! - [`Provenance`]: how a set of artifacts was produced, including the
//!   SHA-256 of every sibling artifact's bytes
//! - [`ArtifactWriter`]: persists JSON payloads and records their hashes

use crate::error::LabError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use syslab_artifact::{ArtifactUri, ContentHash, Store};

/// Conceptual phases of a multi-step job, in order
pub const ROLES: [&str; 5] = ["plan", "formulate", "solve", "verify", "reflect"];

/// One recorded step of a job trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// 1-based position
    pub step: u32,
    /// Role name from [`ROLES`]
    pub role: String,
    /// Recorded thought
    pub thought: String,
}

/// Caller-facing summary of one trace step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// 1-based position
    pub step: u32,
    /// Step title (the role)
    pub title: String,
    /// Short description
    pub summary: String,
}

/// The first `limit` steps of the role template
///
/// Not execution dependent: the same `limit` always yields the same steps.
#[must_use]
pub fn trace_steps(limit: usize) -> Vec<TraceStep> {
    ROLES
        .iter()
        .take(limit)
        .zip(1u32..)
        .map(|(role, step)| TraceStep {
            step,
            role: (*role).to_string(),
            thought: (*role).to_string(),
        })
        .collect()
}

/// Milestones for a trace
///
/// With `explain` the summary is a readable sentence, otherwise the role.
#[must_use]
pub fn milestones(steps: &[TraceStep], explain: bool) -> Vec<Milestone> {
    steps
        .iter()
        .map(|s| Milestone {
            step: s.step,
            title: s.role.clone(),
            summary: if explain {
                explain_role(&s.role).to_string()
            } else {
                s.role.clone()
            },
        })
        .collect()
}

fn explain_role(role: &str) -> &'static str {
    match role {
        "plan" => "Restate the objective and list what must be decided.",
        "formulate" => "Translate the objective and constraints into a solvable model.",
        "solve" => "Run the solver on the formulated model.",
        "verify" => "Check the solution against every constraint.",
        "reflect" => "Summarize the result and note what to revisit.",
        _ => "Unrecognized step.",
    }
}

/// Provenance record written next to a job's artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Producing tool name
    pub tool: String,
    /// Component versions
    pub versions: BTreeMap<String, String>,
    /// Random seeds used (empty for deterministic kernels)
    pub seeds: BTreeMap<String, u64>,
    /// Inputs the tool ran with
    pub inputs: Value,
    /// SHA-256 of each produced artifact, by file name
    pub hashes: BTreeMap<String, ContentHash>,
    /// Production time
    pub created_at: DateTime<Utc>,
}

impl Provenance {
    /// Fresh record for `tool`
    #[must_use]
    pub fn new(tool: impl Into<String>, inputs: Value) -> Self {
        let versions = [
            ("syslab-core".to_string(), crate::VERSION.to_string()),
            ("syslab-artifact".to_string(), syslab_artifact::VERSION.to_string()),
        ]
        .into_iter()
        .collect();
        Self {
            tool: tool.into(),
            versions,
            seeds: BTreeMap::new(),
            inputs,
            hashes: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Writes JSON artifacts and remembers what it wrote
#[derive(Debug)]
pub struct ArtifactWriter<'a> {
    store: &'a Store,
    written: Vec<ArtifactUri>,
    hashes: BTreeMap<String, ContentHash>,
}

impl<'a> ArtifactWriter<'a> {
    /// Writer over `store`
    #[inline]
    #[must_use]
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            written: Vec::new(),
            hashes: BTreeMap::new(),
        }
    }

    /// Persist `value` as pretty JSON at `uri`
    ///
    /// # Errors
    /// Encoding or store failure
    pub fn json<T>(&mut self, uri: ArtifactUri, value: &T) -> Result<ArtifactUri, LabError>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec_pretty(value)?;
        let uri = self.store.write_bytes(&uri, &bytes)?;
        if let Some(name) = uri.file_name() {
            self.hashes
                .insert(name.to_string(), ContentHash::compute(&bytes));
        }
        self.written.push(uri.clone());
        Ok(uri)
    }

    /// Persist raw bytes at `uri`
    ///
    /// # Errors
    /// Store failure
    pub fn bytes(&mut self, uri: ArtifactUri, bytes: &[u8]) -> Result<ArtifactUri, LabError> {
        let uri = self.store.write_bytes(&uri, bytes)?;
        if let Some(name) = uri.file_name() {
            self.hashes
                .insert(name.to_string(), ContentHash::compute(bytes));
        }
        self.written.push(uri.clone());
        Ok(uri)
    }

    /// Copy recorded hashes into a provenance record
    pub fn stamp(&self, provenance: &mut Provenance) {
        provenance
            .hashes
            .extend(self.hashes.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// URIs written so far, in order
    #[inline]
    #[must_use]
    pub fn written(&self) -> &[ArtifactUri] {
        &self.written
    }
}
