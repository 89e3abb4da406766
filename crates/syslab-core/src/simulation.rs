//! Simulation runner (`sd.run_simulation`)
//!
//! Runs a system-dynamics model and stores three artifacts under
//! `runs/<run_id>/`: `series.json`, `metrics.json` and `provenance.json`.
//!
//! Runs are content-addressed: `run_id` is the [`JobId`] of the model,
//! its resolved parameters, `horizon_steps` and `dt`. The kernels are
//! deterministic, so repeating a request rewrites the same files.

use crate::error::LabError;
use crate::pipeline::{ArtifactWriter, Provenance};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use syslab_artifact::{ArtifactKind, ArtifactUri, JobId, Store};

/// Tool name recorded in provenance
pub const TOOL_NAME: &str = "sd.run_simulation";

/// Upper bound on `horizon_steps`
pub const MAX_HORIZON_STEPS: u32 = 100_000;

/// Available models
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `y ← y + r·y·(1 − y/K)·dt`
    #[default]
    Logistic,
    /// Bass diffusion, `A ← A + dt·(p + q·A/M)·(M − A)`
    Bass,
}

impl ModelKind {
    /// Parameter names and defaults
    #[must_use]
    pub const fn defaults(self) -> &'static [(&'static str, f64)] {
        match self {
            Self::Logistic => &[("r", 0.3), ("K", 100.0), ("y0", 10.0)],
            Self::Bass => &[("p", 0.03), ("q", 0.38), ("M", 10_000.0)],
        }
    }
}

/// Simulation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Model to run
    #[serde(default)]
    pub model: ModelKind,
    /// Model parameters; missing ones take the model defaults
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    /// Number of integration steps
    #[serde(default = "default_horizon_steps")]
    pub horizon_steps: u32,
    /// Step size
    #[serde(default = "default_dt")]
    pub dt: f64,
}

fn default_horizon_steps() -> u32 {
    20
}

fn default_dt() -> f64 {
    1.0
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            params: BTreeMap::new(),
            horizon_steps: default_horizon_steps(),
            dt: default_dt(),
        }
    }
}

impl SimulationRequest {
    /// Request for `model` with default parameters
    #[must_use]
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Set one parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Set horizon and step size
    #[must_use]
    pub fn with_horizon(mut self, horizon_steps: u32, dt: f64) -> Self {
        self.horizon_steps = horizon_steps;
        self.dt = dt;
        self
    }

    /// Parameters with defaults filled in; unknown names are dropped
    #[must_use]
    pub fn resolved_params(&self) -> BTreeMap<String, f64> {
        self.model
            .defaults()
            .iter()
            .map(|(name, default)| {
                let value = self.params.get(*name).copied().unwrap_or(*default);
                ((*name).to_string(), value)
            })
            .collect()
    }

    /// Content-derived run identity
    ///
    /// # Errors
    /// Returns error if the identity payload cannot be encoded
    pub fn run_id(&self) -> Result<JobId, LabError> {
        Ok(JobId::of_json(&self.identity_payload())?)
    }

    fn identity_payload(&self) -> serde_json::Value {
        json!({
            "model": self.model,
            "params": self.resolved_params(),
            "horizon_steps": self.horizon_steps,
            "dt": self.dt,
        })
    }

    fn validate(&self) -> Result<(), LabError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(LabError::invalid("dt must be a finite number > 0"));
        }
        if self.horizon_steps > MAX_HORIZON_STEPS {
            return Err(LabError::invalid(format!(
                "horizon_steps must be <= {MAX_HORIZON_STEPS}"
            )));
        }
        for name in self.params.keys() {
            if !self.model.defaults().iter().any(|(known, _)| *known == name.as_str()) {
                tracing::warn!(param = %name, model = ?self.model, "ignoring unknown parameter");
            }
        }
        let params = self.resolved_params();
        if let Some((name, _)) = params.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LabError::invalid(format!("parameter {name} must be finite")));
        }
        let scale = match self.model {
            ModelKind::Logistic => "K",
            ModelKind::Bass => "M",
        };
        if params[scale] <= 0.0 {
            return Err(LabError::invalid(format!("{scale} must be > 0")));
        }
        Ok(())
    }
}

/// Time grid and values produced by a kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Time points, starting at 0
    pub t: Vec<f64>,
    /// Value at each time point
    pub series: Vec<f64>,
}

/// Explicit Euler logistic growth
#[must_use]
pub fn logistic(r: f64, k: f64, y0: f64, steps: u32, dt: f64) -> Trajectory {
    integrate(y0, steps, dt, |y| y + r * y * (1.0 - y / k) * dt)
}

/// Explicit Euler Bass diffusion starting from zero adopters
///
/// Each step is clamped to `[0, M]`.
#[must_use]
pub fn bass(p: f64, q: f64, m: f64, steps: u32, dt: f64) -> Trajectory {
    integrate(0.0, steps, dt, |a| {
        let gap = (m - a).max(0.0);
        let rate = p * gap + (q / m) * a * gap;
        (a + dt * rate).clamp(0.0, m)
    })
}

fn integrate(start: f64, steps: u32, dt: f64, step: impl Fn(f64) -> f64) -> Trajectory {
    let capacity = steps as usize + 1;
    let mut t = Vec::with_capacity(capacity);
    let mut series = Vec::with_capacity(capacity);
    let mut y = start;
    t.push(0.0);
    series.push(y);
    for i in 1..=steps {
        y = step(y);
        t.push(f64::from(i) * dt);
        series.push(y);
    }
    Trajectory { t, series }
}

/// Summary metrics of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Last value
    #[serde(rename = "final")]
    pub final_value: f64,
    /// Largest value
    pub max: f64,
    /// Bass only: adopters at the end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_adopters: Option<f64>,
    /// Bass only: market potential `M`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_potential: Option<f64>,
    /// Bass only: `final / M`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption_fraction: Option<f64>,
}

/// Result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    /// Content-derived run identity
    pub run_id: JobId,
    /// Series and metrics URIs
    pub resources: Vec<ArtifactUri>,
    /// Same values as `metrics.json`
    pub summary: SimulationMetrics,
    /// Provenance record URI
    pub provenance: ArtifactUri,
}

/// Run a simulation and persist its artifacts
///
/// # Errors
/// [`LabError::InvalidParameters`] for rejected input, store errors on
/// write failure.
pub fn run_simulation(
    request: &SimulationRequest,
    store: &Store,
) -> Result<SimulationOutput, LabError> {
    request.validate()?;
    let params = request.resolved_params();
    let run_id = request.run_id()?;

    let trajectory = match request.model {
        ModelKind::Logistic => logistic(
            params["r"],
            params["K"],
            params["y0"],
            request.horizon_steps,
            request.dt,
        ),
        ModelKind::Bass => bass(
            params["p"],
            params["q"],
            params["M"],
            request.horizon_steps,
            request.dt,
        ),
    };

    if let Some(step) = trajectory.series.iter().position(|v| !v.is_finite()) {
        return Err(LabError::invalid(format!(
            "trajectory diverged at step {step}; reduce the rate parameters or dt"
        )));
    }

    let final_value = trajectory.series.last().copied().unwrap_or_default();
    let max = trajectory
        .series
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mut metrics = SimulationMetrics {
        final_value,
        max,
        final_adopters: None,
        market_potential: None,
        adoption_fraction: None,
    };
    if request.model == ModelKind::Bass {
        let m = params["M"];
        metrics.final_adopters = Some(final_value);
        metrics.market_potential = Some(m);
        metrics.adoption_fraction = Some(final_value / m);
    }

    let run_dir = ArtifactKind::Runs.uri([run_id.as_str()]);
    let mut writer = ArtifactWriter::new(store);
    let series_uri = writer.json(
        run_dir.join("series.json"),
        &json!({
            "model": request.model,
            "t": trajectory.t,
            "series": trajectory.series,
            "dt": request.dt,
        }),
    )?;
    let metrics_uri = writer.json(run_dir.join("metrics.json"), &metrics)?;

    let mut provenance = Provenance::new(TOOL_NAME, request.identity_payload());
    writer.stamp(&mut provenance);
    let provenance_uri = writer.json(run_dir.join("provenance.json"), &provenance)?;

    tracing::info!(run_id = %run_id, model = ?request.model, steps = request.horizon_steps, "simulation stored");

    Ok(SimulationOutput {
        run_id,
        resources: vec![series_uri, metrics_uri],
        summary: metrics,
        provenance: provenance_uri,
    })
}
