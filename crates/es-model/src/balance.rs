//! Conservation rows: bus balances, converter ratios and storage levels.

use es_core::{Id, VarId};
use es_graph::{Graph, GraphError, Node, NodeKind, StorageParams};
use es_solver::{LpProblem, Sense};
use tracing::{debug, warn};

use crate::error::ModelResult;
use crate::vars::VarIndex;

/// `sum(inflows(t)) - sum(outflows(t)) = 0` per bus and timestep.
///
/// Buses without flows get no rows.
pub(crate) fn add_bus_balances(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &VarIndex,
) -> ModelResult<usize> {
    let mut rows = 0;
    for (bus, flows) in graph.traverse_buses() {
        if flows.inflows.is_empty() && flows.outflows.is_empty() {
            warn!(bus = %bus.label, "bus has no flows, no balance emitted");
            continue;
        }
        for t in graph.horizon().steps() {
            let terms = flows
                .inflows
                .iter()
                .map(|f| (vars.flow(*f, t), 1.0))
                .chain(flows.outflows.iter().map(|f| (vars.flow(*f, t), -1.0)));
            lp.add_constraint(format!("balance({},{t})", bus.label), terms, Sense::Eq, 0.0)?;
            rows += 1;
        }
    }
    debug!(rows, "bus balances added");
    Ok(rows)
}

fn factor<'g>(graph: &'g Graph, node: &Node, flow: Id) -> Result<(f64, &'g str), GraphError> {
    let bus = graph.flows()[flow.idx()].bus;
    let label = graph.bus(bus).map_or("?", |b| b.label.as_str());
    node.conversion_factor(bus)
        .map(|f| (f, label))
        .ok_or_else(|| GraphError::ConversionFactors {
            converter: node.label.clone(),
            reason: format!("no factor for bus '{label}'"),
        })
}

/// `in(t) * f_out = out(t) * f_in` for every input/output pair of a converter.
pub(crate) fn add_conversions(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &VarIndex,
) -> ModelResult<usize> {
    let mut rows = 0;
    for node in graph.nodes() {
        if !matches!(node.kind, NodeKind::Converter { .. }) {
            continue;
        }
        for &input in &node.inputs {
            let (f_in, in_bus) = factor(graph, node, input)?;
            for &output in &node.outputs {
                let (f_out, out_bus) = factor(graph, node, output)?;
                for t in graph.horizon().steps() {
                    lp.add_constraint(
                        format!("conversion({},{in_bus},{out_bus},{t})", node.label),
                        [(vars.flow(input, t), f_out), (vars.flow(output, t), -f_in)],
                        Sense::Eq,
                        0.0,
                    )?;
                    rows += 1;
                }
            }
        }
    }
    debug!(rows, "conversion rows added");
    Ok(rows)
}

/// Storage level columns and their recurrence.
///
/// `level(0)` is pinned to the initial level and the storage exchanges no
/// net energy in the first step. For `t >= 1`:
/// `level(t) = (1 - loss)·level(t-1) + eff_in·in(t) - out(t)/eff_out`.
pub(crate) fn add_storage_levels(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &mut VarIndex,
) -> ModelResult<usize> {
    let mut storages = 0;
    for (node, params) in graph.storages() {
        let ([input], [output]) = (node.inputs.as_slice(), node.outputs.as_slice()) else {
            return Err(GraphError::InvalidTopology {
                node: node.label.clone(),
                reason: "storage needs exactly one input and one output".to_string(),
            }
            .into());
        };
        let levels = add_level_columns(graph, lp, vars, node, params)?;
        let label = &node.label;
        let eff_in = params.charge_efficiency;
        let eff_out = params.discharge_efficiency;

        lp.add_constraint(
            format!("storage_exchange({label},0)"),
            [(vars.flow(*input, 0), eff_in), (vars.flow(*output, 0), -1.0 / eff_out)],
            Sense::Eq,
            0.0,
        )?;
        for t in 1..levels.len() {
            lp.add_constraint(
                format!("storage_balance({label},{t})"),
                [
                    (levels[t], 1.0),
                    (levels[t - 1], -(1.0 - params.loss_rate)),
                    (vars.flow(*input, t), -eff_in),
                    (vars.flow(*output, t), 1.0 / eff_out),
                ],
                Sense::Eq,
                0.0,
            )?;
        }
        if params.balanced && levels.len() > 1 {
            lp.add_constraint(
                format!("storage_balanced({label})"),
                [(levels[levels.len() - 1], 1.0)],
                Sense::Eq,
                params.initial_level,
            )?;
        }
        storages += 1;
    }
    debug!(storages, "storage levels added");
    Ok(storages)
}

fn add_level_columns(
    graph: &Graph,
    lp: &mut LpProblem,
    vars: &mut VarIndex,
    node: &Node,
    params: &StorageParams,
) -> ModelResult<Vec<VarId>> {
    let invest = vars.storage_investment(node.id);
    let capacity = params.nominal_capacity.unwrap_or(f64::INFINITY);
    vars.storage_base[node.id.idx()] = Some(Id::from_usize(lp.num_vars()));

    let mut levels = Vec::with_capacity(graph.horizon().len());
    for t in graph.horizon().steps() {
        let (lower, upper) = if t == 0 {
            (params.initial_level, params.initial_level)
        } else {
            (0.0, capacity)
        };
        let level = lp.add_variable(format!("storage_level({},{t})", node.label), lower, upper)?;
        if let (Some(added), Some(inv)) = (invest, &params.investment) {
            lp.add_constraint(
                format!("storage_capacity({},{t})", node.label),
                [(level, 1.0), (added, -1.0)],
                Sense::Le,
                inv.existing,
            )?;
        }
        levels.push(level);
    }
    Ok(levels)
}
