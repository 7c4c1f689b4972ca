//! es-model: compiles an energy-system graph into a linear program.
//!
//! The compiler emits, for a [`Graph`](es_graph::Graph) over its time horizon:
//! - one column per flow and timestep, bounded by the flow's capacity
//! - added-capacity columns for investable flows and storages
//! - bus balances, converter ratios and storage level recurrences
//! - the cost objective, weighted per timestep
//!
//! Solving goes through any [`LpSolver`](es_solver::LpSolver); values are read
//! back by label from the [`SolvedModel`].

mod balance;
pub mod error;
mod flows;
mod investment;
pub mod model;
mod objective;
pub mod results;
pub mod vars;

pub use error::{ModelError, ModelResult};
pub use model::{CompileOptions, Model, ModelStats};
pub use results::{FlowSeries, InvestmentResult, MetaResults, SolvedModel};
pub use vars::VarIndex;
