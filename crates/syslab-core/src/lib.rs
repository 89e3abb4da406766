//! Systems Lab producer pipelines
//!
//! Each pipeline takes typed parameters plus an explicit `&Store`, runs its
//! kernel, writes its results as JSON artifacts and returns their URIs with
//! a summary:
//!
//! - [`run_simulation`]: logistic / Bass models → `runs/<run_id>/…`
//! - [`optimize_policy`]: solver + fixed step trace → `opt/<job_id>/…`,
//!   `traces/<job_id>/…`
//! - [`export_notebook`]: stored artifacts → `viz/exports/<title>.html`
//!
//! # Example
//!
//! ```rust,ignore
//! use syslab_core::{run_simulation, LabConfig, SimulationRequest};
//!
//! let store = LabConfig::from_env()?.open_store()?;
//! let out = run_simulation(&SimulationRequest::default(), &store)?;
//! println!("final = {}", out.summary.final_value);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod export;
pub mod optimize;
pub mod pipeline;
pub mod resources;
pub mod simulation;
pub mod solver;

pub use config::{ConfigError, LabConfig, STORE_DIR_VAR};
pub use error::LabError;
pub use export::{export_notebook, ExportFormat, ExportOutput, ExportRequest, ExportSummary};
pub use optimize::{formulate, optimize_policy, OptimizeOutput, OptimizeRequest, Trace, Verification};
pub use pipeline::{Milestone, Provenance, TraceStep, ROLES};
pub use resources::{catalog, read_resource, Catalog, CATALOG_URI};
pub use simulation::{
    run_simulation, ModelKind, SimulationMetrics, SimulationOutput, SimulationRequest, Trajectory,
};
pub use solver::{BudgetSolver, Problem, Sense, Solution, SolveError, SolveStatus, Solver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
