//! Objective assembly.

use es_graph::Graph;
use es_solver::LpProblem;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::model::CompileOptions;
use crate::vars::VarIndex;

/// Per-timestep objective weights.
///
/// An explicit weighting must match the horizon length and be finite and
/// non-negative. Otherwise the horizon's duration weights apply.
pub(crate) fn resolve_weights(graph: &Graph, options: &CompileOptions) -> ModelResult<Vec<f64>> {
    let Some(weights) = &options.objective_weighting else {
        return Ok(graph.horizon().durations().to_vec());
    };
    let expected = graph.horizon().len();
    if weights.len() != expected {
        return Err(ModelError::WeightingLength {
            expected,
            actual: weights.len(),
        });
    }
    if let Some((timestep, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(ModelError::InvalidWeighting { timestep, value });
    }
    Ok(weights.clone())
}

/// `sum(flow(t)·cost·w(t)) + sum(added·ep_costs)`.
pub(crate) fn add_objective(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &VarIndex,
    weights: &[f64],
) -> ModelResult<()> {
    let mut terms = 0;
    for flow in graph.flows() {
        let cost = flow.spec.variable_cost;
        if cost != 0.0 {
            for (t, w) in weights.iter().enumerate() {
                lp.add_objective_term(vars.flow(flow.id, t), cost * w)?;
                terms += 1;
            }
        }
        if let (Some(var), Some(inv)) = (vars.flow_investment(flow.id), &flow.spec.investment) {
            lp.add_objective_term(var, inv.ep_costs)?;
            terms += 1;
        }
    }
    for (node, params) in graph.storages() {
        if let (Some(var), Some(inv)) = (vars.storage_investment(node.id), &params.investment) {
            lp.add_objective_term(var, inv.ep_costs)?;
            terms += 1;
        }
    }
    debug!(terms, "objective assembled");
    Ok(())
}
