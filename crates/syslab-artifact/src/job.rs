//! Deterministic job identity
//!
//! A [`JobId`] is the 16-hex-char prefix of the SHA-256 digest of a
//! request's canonical JSON. Identical semantic content always maps to the
//! same id, across processes and platforms.

use crate::hash::{ContentHash, HashError, SHORT_HEX_LEN};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Short content-derived identifier, usable as a path segment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Id of an already computed hash
    #[inline]
    #[must_use]
    pub fn from_hash(hash: &ContentHash) -> Self {
        Self(hash.short())
    }

    /// Id of any serializable value (canonical JSON, key order ignored)
    ///
    /// # Errors
    /// Returns error if `value` cannot be represented as JSON
    pub fn of_json<T>(value: &T) -> Result<Self, HashError>
    where
        T: Serialize + ?Sized,
    {
        ContentHash::of_json(value).map(|hash| Self::from_hash(&hash))
    }

    /// Hex string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = JobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == SHORT_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(JobIdError(s.to_string()))
        }
    }
}

impl TryFrom<String> for JobId {
    type Error = JobIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// Rejected job id string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job id '{0}': expected 16 lowercase hex chars")]
pub struct JobIdError(String);

/// Semantic content of an optimization job
///
/// Only these four fields take part in the identity; execution knobs such
/// as step limits do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Objective description (free-form)
    #[serde(default)]
    pub objective: Option<Value>,
    /// Constraint list
    #[serde(default)]
    pub constraints: Option<Value>,
    /// Decision variable list
    #[serde(default)]
    pub decision_vars: Option<Value>,
    /// Named input references
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl JobRequest {
    /// Identity of this request
    #[must_use]
    pub fn job_id(&self) -> JobId {
        compute_job_id(
            self.objective.as_ref(),
            self.constraints.as_ref(),
            self.decision_vars.as_ref(),
            &self.inputs,
        )
    }
}

/// Hash the four semantic fields of a job into a [`JobId`]
///
/// Missing fields encode as `null`. Pure: no I/O, no randomness.
#[must_use]
pub fn compute_job_id(
    objective: Option<&Value>,
    constraints: Option<&Value>,
    decision_vars: Option<&Value>,
    inputs: &[String],
) -> JobId {
    let payload = serde_json::json!({
        "objective": objective,
        "constraints": constraints,
        "decision_vars": decision_vars,
        "inputs": inputs,
    });
    let canonical = crate::hash::canonical_json(&payload);
    JobId::from_hash(&ContentHash::compute(canonical.as_bytes()))
}
