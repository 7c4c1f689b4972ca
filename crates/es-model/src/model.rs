//! Compiled model: the LP of one graph.

use std::path::Path;

use es_graph::Graph;
use es_solver::{LpProblem, LpSolver, SolveOptions, SolveOutcome, write_lp_file, write_lp_string};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ModelResult;
use crate::results::SolvedModel;
use crate::vars::VarIndex;
use crate::{balance, flows, investment, objective};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Per-timestep objective weights; the horizon durations when `None`.
    pub objective_weighting: Option<Vec<f64>>,
}

impl CompileOptions {
    pub fn with_weighting(weights: Vec<f64>) -> Self {
        Self {
            objective_weighting: Some(weights),
        }
    }
}

/// Size of a compiled model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub timesteps: usize,
    pub buses: usize,
    pub flows: usize,
    pub storages: usize,
    pub investments: usize,
    pub variables: usize,
    pub constraints: usize,
    pub nonzeros: usize,
}

/// A graph compiled into a linear program.
///
/// The model borrows its graph; compile one model per graph and solve it
/// once. Models share no state, so independent graphs can be compiled on
/// separate threads.
#[derive(Debug)]
pub struct Model<'g> {
    graph: &'g Graph,
    lp: LpProblem,
    vars: VarIndex,
    weights: Vec<f64>,
    storages: usize,
    investments: usize,
}

impl<'g> Model<'g> {
    pub fn compile(graph: &'g Graph, options: &CompileOptions) -> ModelResult<Self> {
        let weights = objective::resolve_weights(graph, options)?;
        let mut lp = LpProblem::new("esflow");
        let mut vars = VarIndex::new(graph);

        let investments = investment::add_investment_variables(graph, &mut lp, &mut vars)?;
        flows::add_flow_variables(graph, &mut lp, &mut vars)?;
        let storages = balance::add_storage_levels(graph, &mut lp, &mut vars)?;
        balance::add_bus_balances(graph, &mut lp, &vars)?;
        balance::add_conversions(graph, &mut lp, &vars)?;
        objective::add_objective(graph, &mut lp, &vars, &weights)?;

        let model = Self {
            graph,
            lp,
            vars,
            weights,
            storages,
            investments,
        };
        let stats = model.stats();
        info!(
            timesteps = stats.timesteps,
            variables = stats.variables,
            constraints = stats.constraints,
            nonzeros = stats.nonzeros,
            "Model compiled"
        );
        Ok(model)
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn problem(&self) -> &LpProblem {
        &self.lp
    }

    pub fn vars(&self) -> &VarIndex {
        &self.vars
    }

    /// Objective weight applied to each timestep.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn stats(&self) -> ModelStats {
        let lp = self.lp.stats();
        ModelStats {
            timesteps: self.graph.horizon().len(),
            buses: self.graph.buses().len(),
            flows: self.graph.flows().len(),
            storages: self.storages,
            investments: self.investments,
            variables: lp.variables,
            constraints: lp.constraints,
            nonzeros: lp.nonzeros,
        }
    }

    /// Write the LP in CPLEX LP format, for inspection or an external solver.
    pub fn write_lp(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        write_lp_file(&self.lp, path)?;
        Ok(())
    }

    pub fn lp_string(&self) -> String {
        write_lp_string(&self.lp)
    }

    /// Hand the LP to `solver`. Infeasible or unbounded problems are reported
    /// through the status of the returned model.
    pub fn solve(
        &self,
        solver: &dyn LpSolver,
        options: &SolveOptions,
    ) -> ModelResult<SolvedModel<'_>> {
        let outcome = solver.solve(&self.lp, options)?;
        info!(
            status = %outcome.status,
            objective = ?outcome.objective,
            solve_time_s = outcome.solve_time_s,
            "Model solved"
        );
        Ok(self.with_outcome(outcome))
    }

    /// Attach an outcome obtained elsewhere, e.g. restored from disk.
    pub fn with_outcome(&self, outcome: SolveOutcome) -> SolvedModel<'_> {
        SolvedModel::new(self, outcome)
    }
}
