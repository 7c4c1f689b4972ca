//! Solver boundary: options, outcomes and the `LpSolver` trait.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LpResult;
use crate::problem::LpProblem;

/// Backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverChoice {
    /// Interior-point, pure Rust.
    #[default]
    Clarabel,
    /// Dual simplex via the HiGHS library.
    Highs,
}

impl SolverChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverChoice::Clarabel => "clarabel",
            SolverChoice::Highs => "highs",
        }
    }

    /// Whether this backend was compiled in.
    pub fn is_available(self) -> bool {
        match self {
            SolverChoice::Clarabel => cfg!(feature = "solver-clarabel"),
            SolverChoice::Highs => cfg!(feature = "solver-highs"),
        }
    }
}

impl fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clarabel" => Ok(SolverChoice::Clarabel),
            "highs" => Ok(SolverChoice::Highs),
            other => Err(format!("unknown solver '{other}' (expected clarabel or highs)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    pub solver: SolverChoice,
    /// Forward solver log output.
    pub verbose: bool,
    pub time_limit_s: Option<f64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            solver: SolverChoice::default(),
            verbose: false,
            time_limit_s: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a solver returned.
///
/// `values` is indexed like `LpProblem::variables()` and is empty unless the
/// status is `Optimal`; `objective` is likewise `None` without a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub values: Vec<f64>,
    pub objective: Option<f64>,
    pub solve_time_s: f64,
    pub solver: String,
}

impl SolveOutcome {
    /// An outcome without a primal solution.
    pub fn without_solution(
        status: SolveStatus,
        solver: impl Into<String>,
        solve_time_s: f64,
    ) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
            solve_time_s,
            solver: solver.into(),
        }
    }
}

/// An external LP solver.
pub trait LpSolver: Send + Sync {
    /// Identifier recorded with results, e.g. `good_lp/clarabel`.
    fn name(&self, options: &SolveOptions) -> String;

    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> LpResult<SolveOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_choice_parses() {
        assert_eq!("HiGHS".parse::<SolverChoice>().unwrap(), SolverChoice::Highs);
        assert_eq!("clarabel".parse::<SolverChoice>().unwrap(), SolverChoice::Clarabel);
        assert!("cbc".parse::<SolverChoice>().is_err());
        assert_eq!(SolverChoice::default().to_string(), "clarabel");
    }

    #[test]
    fn status_helpers() {
        assert!(SolveStatus::Optimal.is_optimal());
        assert!(!SolveStatus::TimedOut.is_optimal());
        assert_eq!(SolveStatus::TimedOut.to_string(), "timed_out");
        assert_eq!(SolveStatus::Infeasible.as_str(), "infeasible");
    }
}
