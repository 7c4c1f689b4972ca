//! Investment extension: horizon-wide added-capacity variables.

use es_graph::{Graph, Investment};
use es_solver::LpProblem;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::vars::VarIndex;

/// Reject limits that leave no admissible capacity.
pub(crate) fn check_bounds(owner: &str, inv: &Investment) -> ModelResult<()> {
    let fail = |reason| ModelError::InvalidInvestmentBounds {
        owner: owner.to_string(),
        maximum: inv.maximum,
        existing: inv.existing,
        reason,
    };
    if !inv.existing.is_finite() || inv.existing < 0.0 {
        return Err(fail("existing capacity must be finite and non-negative"));
    }
    if let Some(maximum) = inv.maximum {
        if maximum.is_nan() || maximum < 0.0 {
            return Err(fail("maximum is negative"));
        }
        if maximum < inv.existing {
            return Err(fail("maximum is below the existing capacity"));
        }
    }
    Ok(())
}

/// One `[0, maximum]` column per investable flow and storage.
pub(crate) fn add_investment_variables(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &mut VarIndex,
) -> ModelResult<usize> {
    let mut count = 0;
    for flow in graph.flows() {
        let Some(inv) = &flow.spec.investment else {
            continue;
        };
        let (from, to) = graph.flow_endpoints(flow);
        check_bounds(&format!("{from}->{to}"), inv)?;
        let upper = inv.maximum.unwrap_or(f64::INFINITY);
        let var = lp.add_variable(format!("invest({from},{to})"), 0.0, upper)?;
        vars.flow_invest[flow.id.idx()] = Some(var);
        count += 1;
    }
    for (node, params) in graph.storages() {
        let Some(inv) = &params.investment else {
            continue;
        };
        check_bounds(&node.label, inv)?;
        let upper = inv.maximum.unwrap_or(f64::INFINITY);
        let var = lp.add_variable(format!("invest({})", node.label), 0.0, upper)?;
        vars.storage_invest[node.id.idx()] = Some(var);
        count += 1;
    }
    debug!(count, "investment variables added");
    Ok(count)
}
