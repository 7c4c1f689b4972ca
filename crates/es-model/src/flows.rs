//! Flow variables and capacity limits.

use es_core::Id;
use es_graph::Graph;
use es_solver::{LpProblem, Sense};
use tracing::debug;

use crate::error::ModelResult;
use crate::vars::VarIndex;

/// One column per (flow, timestep).
///
/// Without investment the capacity limit is a plain bound: `[0, p(t)·cap]`
/// for free flows, pinned to `p(t)·cap` for fixed ones, `[0, ∞)` when the
/// flow has no capacity at all. With investment the column is `[0, ∞)` and a
/// row ties it to the added capacity:
/// `flow(t) - p(t)·added <= p(t)·existing` (`=` when fixed).
pub(crate) fn add_flow_variables(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &mut VarIndex,
) -> ModelResult<()> {
    let steps = graph.horizon().len();
    let mut capacity_rows = 0;

    for flow in graph.flows() {
        let (from, to) = graph.flow_endpoints(flow);
        let spec = &flow.spec;
        let invest = vars.flow_investment(flow.id);
        vars.flow_base.push(Id::from_usize(lp.num_vars()));

        for t in 0..steps {
            let factor = spec.factor_at(t);
            let (lower, upper) = match (invest, spec.nominal_value) {
                (Some(_), _) | (None, None) => (0.0, f64::INFINITY),
                (None, Some(nominal)) if spec.fixed => (factor * nominal, factor * nominal),
                (None, Some(nominal)) => (0.0, factor * nominal),
            };
            let var = lp.add_variable(format!("flow({from},{to},{t})"), lower, upper)?;

            if let (Some(added), Some(inv)) = (invest, &spec.investment) {
                let sense = if spec.fixed { Sense::Eq } else { Sense::Le };
                lp.add_constraint(
                    format!("capacity({from},{to},{t})"),
                    [(var, 1.0), (added, -factor)],
                    sense,
                    factor * inv.existing,
                )?;
                capacity_rows += 1;
            }
        }
    }
    debug!(
        flows = graph.flows().len(),
        capacity_rows, "flow variables added"
    );
    Ok(())
}
