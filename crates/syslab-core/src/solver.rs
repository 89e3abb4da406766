//! Solver boundary for the policy optimizer
//!
//! The optimizer only sees [`Solver::solve`]. [`BudgetSolver`] is the
//! built-in backend: a linear objective over non-negative variables with a
//! single shared budget `Σ xᵢ ≤ b`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optimization direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    /// Maximize the objective
    #[default]
    Max,
    /// Minimize the objective
    Min,
}

/// A linear problem over non-negative variables with one budget row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Direction
    pub sense: Sense,
    /// `(variable, objective coefficient)`, in declaration order
    pub coefficients: Vec<(String, f64)>,
    /// Right-hand side of `Σ xᵢ ≤ budget`
    pub budget: f64,
}

impl Problem {
    /// `max x + y  s.t.  x + y ≤ 1`
    #[must_use]
    pub fn toy() -> Self {
        Self {
            sense: Sense::Max,
            coefficients: vec![("x".to_string(), 1.0), ("y".to_string(), 1.0)],
            budget: 1.0,
        }
    }
}

/// Solver outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Optimal solution found
    Optimal,
    /// No feasible point exists
    Infeasible,
}

/// Solver result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Outcome
    pub status: SolveStatus,
    /// Objective at `vars`
    pub objective_value: f64,
    /// Variable values
    pub vars: BTreeMap<String, f64>,
}

/// Solver backend
pub trait Solver: Send + Sync {
    /// Backend name recorded in traces
    fn name(&self) -> &str;

    /// Solve `problem`
    ///
    /// # Errors
    /// Returns error if the backend cannot process the problem
    fn solve(&self, problem: &Problem) -> Result<Solution, SolveError>;
}

/// Closed-form solver for [`Problem`]
///
/// The optimum of a linear objective over the simplex `{x ≥ 0, Σx ≤ b}`
/// sits at a vertex: either the origin or the whole budget on the single
/// best variable. Ties go to the first declared variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetSolver;

impl Solver for BudgetSolver {
    fn name(&self) -> &str {
        "budget-vertex"
    }

    fn solve(&self, problem: &Problem) -> Result<Solution, SolveError> {
        if let Some((name, _)) = problem.coefficients.iter().find(|(_, c)| !c.is_finite()) {
            return Err(SolveError::InvalidProblem(format!(
                "coefficient of {name} is not finite"
            )));
        }
        if !problem.budget.is_finite() {
            return Err(SolveError::InvalidProblem("budget is not finite".to_string()));
        }

        let mut vars: BTreeMap<String, f64> = problem
            .coefficients
            .iter()
            .map(|(name, _)| (name.clone(), 0.0))
            .collect();

        if problem.budget < 0.0 {
            return Ok(Solution {
                status: SolveStatus::Infeasible,
                objective_value: 0.0,
                vars,
            });
        }

        // Gain per unit of budget, oriented so larger is better.
        let orient = match problem.sense {
            Sense::Max => 1.0,
            Sense::Min => -1.0,
        };
        let mut best: Option<(&str, f64)> = None;
        for (name, coef) in &problem.coefficients {
            let gain = coef * orient;
            if gain > 0.0 && best.map_or(true, |(_, g)| gain > g) {
                best = Some((name.as_str(), gain));
            }
        }

        let objective_value = match best {
            Some((name, gain)) => {
                vars.insert(name.to_string(), problem.budget);
                gain * orient * problem.budget
            }
            None => 0.0,
        };

        Ok(Solution {
            status: SolveStatus::Optimal,
            objective_value,
            vars,
        })
    }
}

/// Solver errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// Problem cannot be handed to the backend
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// Backend failed
    #[error("backend failure: {0}")]
    Backend(String),
}
