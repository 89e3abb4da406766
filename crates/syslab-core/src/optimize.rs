//! Policy optimizer (`or.optimize_policy_seq`)
//!
//! Formulates a [`Problem`] from the request, hands it to a [`Solver`],
//! checks the answer and records a fixed step trace. Both the solution
//! (`opt/<job_id>/solution.json`) and the trace
//! (`traces/<job_id>/trace.json`) are keyed by the request's [`JobId`], so
//! resubmitting an identical request is idempotent.
//!
//! The stored trace always holds every role. `stepsMax` and
//! `explainForHumans` only shape the returned milestones, since they do
//! not take part in the job identity.

use crate::error::LabError;
use crate::pipeline::{milestones, trace_steps, ArtifactWriter, Milestone, TraceStep, ROLES};
use crate::solver::{Problem, Sense, Solution, SolveStatus, Solver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use syslab_artifact::{ArtifactKind, ArtifactUri, JobId, JobRequest, Store};

/// Tool name
pub const TOOL_NAME: &str = "or.optimize_policy_seq";

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Optimization request
///
/// Only the embedded [`JobRequest`] takes part in the job identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Semantic content
    #[serde(flatten)]
    pub job: JobRequest,
    /// Maximum number of milestones to return
    #[serde(default = "default_steps_max", rename = "stepsMax", alias = "steps_max")]
    pub steps_max: u32,
    /// Human-readable milestone summaries
    #[serde(default, rename = "explainForHumans", alias = "explain_for_humans")]
    pub explain_for_humans: bool,
}

fn default_steps_max() -> u32 {
    6
}

impl Default for OptimizeRequest {
    fn default() -> Self {
        Self {
            job: JobRequest::default(),
            steps_max: default_steps_max(),
            explain_for_humans: false,
        }
    }
}

impl OptimizeRequest {
    /// Request around `job` with default knobs
    #[must_use]
    pub fn new(job: JobRequest) -> Self {
        Self {
            job,
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectiveSpec {
    #[serde(default)]
    sense: Sense,
    coefficients: Vec<CoefficientSpec>,
}

#[derive(Debug, Deserialize)]
struct CoefficientSpec {
    name: String,
    coef: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VarSpec {
    Name(String),
    Named { name: String },
}

impl VarSpec {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Named { name } => name,
        }
    }
}

/// Build the solver problem from a request
///
/// - `objective` as `{"sense": "max"|"min", "coefficients": [{"name", "coef"}]}`
///   sets the objective; any other value (text, null) means "maximize the
///   sum of the decision variables"
/// - `decision_vars` as names or `{"name": ...}` objects; defaults to `x, y`
/// - every constraint object with a numeric `"le"` bounds the shared budget;
///   the tightest wins; default budget is 1
///
/// # Errors
/// [`LabError::InvalidParameters`] when a structured field has the wrong
/// shape
pub fn formulate(job: &JobRequest) -> Result<Problem, LabError> {
    let toy = Problem::toy();

    let declared: Vec<String> = match &job.decision_vars {
        None | Some(Value::Null) => toy.coefficients.iter().map(|(n, _)| n.clone()).collect(),
        Some(value) => serde_json::from_value::<Vec<VarSpec>>(value.clone())
            .map_err(|e| LabError::invalid(format!("decision_vars: {e}")))?
            .into_iter()
            .map(VarSpec::into_name)
            .collect(),
    };

    let (sense, coefficients) = match &job.objective {
        Some(value @ Value::Object(_)) => {
            let spec: ObjectiveSpec = serde_json::from_value(value.clone())
                .map_err(|e| LabError::invalid(format!("objective: {e}")))?;
            let mut coefficients: Vec<(String, f64)> =
                declared.iter().map(|name| (name.clone(), 0.0)).collect();
            for c in spec.coefficients {
                match coefficients.iter_mut().find(|(name, _)| *name == c.name) {
                    Some(slot) => slot.1 = c.coef,
                    None => coefficients.push((c.name, c.coef)),
                }
            }
            (spec.sense, coefficients)
        }
        _ => (
            Sense::Max,
            declared.into_iter().map(|name| (name, 1.0)).collect(),
        ),
    };

    let budget = match &job.constraints {
        None | Some(Value::Null) => toy.budget,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|c| c.get("le").and_then(Value::as_f64))
            .reduce(f64::min)
            .unwrap_or(toy.budget),
        Some(_) => return Err(LabError::invalid("constraints must be a list")),
    };

    Ok(Problem {
        sense,
        coefficients,
        budget,
    })
}

/// One post-solve check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Check name
    pub check: String,
    /// Outcome
    pub passed: bool,
    /// Detail
    pub detail: String,
}

/// Check a solution against the problem's constraints
#[must_use]
pub fn verify(problem: &Problem, solution: &Solution) -> Vec<Verification> {
    if solution.status != SolveStatus::Optimal {
        return vec![Verification {
            check: "status".to_string(),
            passed: false,
            detail: format!("solver reported {:?}", solution.status),
        }];
    }
    let total: f64 = solution.vars.values().sum();
    let negative: Vec<&str> = solution
        .vars
        .iter()
        .filter(|(_, v)| **v < -FEASIBILITY_TOLERANCE)
        .map(|(k, _)| k.as_str())
        .collect();
    vec![
        Verification {
            check: "budget".to_string(),
            passed: total <= problem.budget + FEASIBILITY_TOLERANCE,
            detail: format!("sum of variables {total} against budget {}", problem.budget),
        },
        Verification {
            check: "non_negative".to_string(),
            passed: negative.is_empty(),
            detail: if negative.is_empty() {
                "all variables >= 0".to_string()
            } else {
                format!("negative: {}", negative.join(", "))
            },
        },
    ]
}

/// Persisted trace document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Job the trace belongs to
    pub job_id: JobId,
    /// Solver backend name
    pub solver: String,
    /// Recorded steps
    pub steps: Vec<TraceStep>,
}

/// Result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeOutput {
    /// Content-derived job identity
    pub job_id: JobId,
    /// Solver result
    pub solution: Solution,
    /// Trace URI
    pub trace_uri: ArtifactUri,
    /// Step summaries
    pub milestones: Vec<Milestone>,
    /// Post-solve checks
    pub verifications: Vec<Verification>,
    /// Trace and solution URIs
    pub resources: Vec<ArtifactUri>,
}

/// Optimize a policy and persist the solution and trace
///
/// # Errors
/// [`LabError::InvalidParameters`] for rejected input, solver and store
/// errors otherwise.
pub fn optimize_policy(
    request: &OptimizeRequest,
    store: &Store,
    solver: &dyn Solver,
) -> Result<OptimizeOutput, LabError> {
    if request.steps_max == 0 {
        return Err(LabError::invalid("stepsMax must be >= 1"));
    }
    let job_id = request.job.job_id();
    let problem = formulate(&request.job)?;
    let solution = solver.solve(&problem)?;
    let verifications = verify(&problem, &solution);

    let trace = Trace {
        job_id: job_id.clone(),
        solver: solver.name().to_string(),
        steps: trace_steps(ROLES.len()),
    };
    let limit = usize::try_from(request.steps_max).unwrap_or(ROLES.len());
    let shown = &trace.steps[..limit.min(trace.steps.len())];

    let mut writer = ArtifactWriter::new(store);
    let trace_uri = writer.json(
        ArtifactKind::Traces.uri([job_id.as_str(), "trace.json"]),
        &trace,
    )?;
    let solution_uri = writer.json(
        ArtifactKind::Opt.uri([job_id.as_str(), "solution.json"]),
        &solution,
    )?;

    tracing::info!(
        job_id = %job_id,
        solver = solver.name(),
        status = ?solution.status,
        objective = solution.objective_value,
        "optimization stored"
    );

    Ok(OptimizeOutput {
        job_id,
        milestones: milestones(shown, request.explain_for_humans),
        solution,
        trace_uri: trace_uri.clone(),
        verifications,
        resources: vec![trace_uri, solution_uri],
    })
}
