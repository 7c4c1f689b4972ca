//! Compile-time and extraction errors.

use es_graph::GraphError;
use es_solver::{LpError, SolveStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Investment limits that leave no admissible capacity.
    #[error(
        "Invalid investment bounds for '{owner}': {reason} (maximum {maximum:?}, existing {existing})"
    )]
    InvalidInvestmentBounds {
        owner: String,
        maximum: Option<f64>,
        existing: f64,
        reason: &'static str,
    },

    #[error("Objective weighting has {actual} entries, horizon has {expected} timesteps")]
    WeightingLength { expected: usize, actual: usize },

    #[error("Objective weight at timestep {timestep} is {value}, expected a finite non-negative number")]
    InvalidWeighting { timestep: usize, value: f64 },

    #[error("'{label}' is not a storage")]
    NotAStorage { label: String },

    /// Values were requested from a model without an optimal solution.
    #[error("No solution available (solver status: {status})")]
    NoSolution { status: SolveStatus },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("LP error: {0}")]
    Lp(#[from] LpError),
}

pub type ModelResult<T> = Result<T, ModelError>;
