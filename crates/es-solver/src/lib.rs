//! Solver-agnostic linear programs for esflow.
//!
//! The compiler produces an [`LpProblem`]; this crate writes it in CPLEX LP
//! format, reads such files back, and hands problems to an external solver
//! through the [`LpSolver`] trait. [`GoodLpSolver`] is the bundled backend.

pub mod backend;
pub mod error;
pub mod lp_format;
pub mod problem;
pub mod solve;

pub use backend::GoodLpSolver;
pub use error::{LpError, LpResult};
pub use lp_format::{parse_lp, write_lp, write_lp_file, write_lp_string};
pub use problem::{Constraint, LpProblem, ProblemStats, Sense, Variable};
pub use solve::{LpSolver, SolveOptions, SolveOutcome, SolveStatus, SolverChoice};
