//! Built-in artifact kinds

use crate::uri::ArtifactUri;
use std::fmt::{self, Display, Formatter};

/// The kinds a default [`Store`](crate::Store) registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Simulation runs (series, metrics, provenance)
    Runs,
    /// Optimization solutions
    Opt,
    /// Step traces of multi-step jobs
    Traces,
    /// Visual exports (HTML notebooks)
    Viz,
}

impl ArtifactKind {
    /// Every built-in kind, in registration order
    pub const ALL: [Self; 4] = [Self::Runs, Self::Opt, Self::Traces, Self::Viz];

    /// Directory / URI name of the kind
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runs => "runs",
            Self::Opt => "opt",
            Self::Traces => "traces",
            Self::Viz => "viz",
        }
    }

    /// Build a URI of this kind
    #[must_use]
    pub fn uri<I, S>(self, parts: I) -> ArtifactUri
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ArtifactUri::build(self.as_str(), parts)
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
