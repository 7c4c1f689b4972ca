//! Error types for LP assembly, LP files and solver backends.

use thiserror::Error;

/// Failures of the LP layer.
///
/// An infeasible or unbounded problem is not an error; see `SolveStatus`.
#[derive(Error, Debug)]
pub enum LpError {
    #[error("Variable '{name}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    #[error("Duplicate {kind} name: '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Row '{row}' references unknown variable index {index}")]
    UnknownVariable { row: String, index: u32 },

    #[error("Non-finite {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("LP parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Solver '{solver}' is not available in this build")]
    SolverUnavailable { solver: String },

    #[error("Solver backend failed: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LpResult<T> = Result<T, LpError>;
