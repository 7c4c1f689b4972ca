//! Graph validation run by `GraphBuilder::build`.

use std::collections::HashSet;

use es_core::{BusId, ensure_finite, ensure_non_negative};

use crate::error::{GraphError, GraphResult};
use crate::flow::{Flow, Profile};
use crate::graph::{Graph, Node, NodeKind, StorageParams};

pub(crate) fn validate_graph(graph: &Graph) -> GraphResult<()> {
    for flow in graph.flows() {
        validate_flow(graph, flow)?;
    }
    for node in graph.nodes() {
        validate_topology(graph, node)?;
        match &node.kind {
            NodeKind::Converter { conversion_factors } => {
                validate_converter(graph, node, conversion_factors)?
            }
            NodeKind::Storage(params) => validate_storage(&node.label, params)?,
            NodeKind::Source | NodeKind::Sink => {}
        }
    }
    Ok(())
}

fn finite_non_negative(what: impl FnOnce() -> String, value: f64) -> GraphResult<()> {
    ensure_non_negative(value, "value")
        .map(drop)
        .map_err(|err| GraphError::numeric(what(), err))
}

fn validate_flow(graph: &Graph, flow: &Flow) -> GraphResult<()> {
    let label = graph.flow_label(flow.id);
    let spec = &flow.spec;

    if let Some(nominal) = spec.nominal_value {
        finite_non_negative(|| format!("nominal value of '{label}'"), nominal)?;
    }
    if let Err(err) = ensure_finite(spec.variable_cost, "variable cost") {
        return Err(GraphError::numeric(format!("variable cost of '{label}'"), err));
    }
    if let Some(inv) = &spec.investment {
        if let Err(err) = ensure_finite(inv.ep_costs, "investment cost") {
            return Err(GraphError::numeric(format!("investment cost of '{label}'"), err));
        }
    }

    if let Some(profile) = &spec.profile {
        validate_profile(graph, &label, profile)?;
    } else if spec.fixed {
        return Err(GraphError::invalid(
            format!("profile of '{label}'"),
            f64::NAN,
            "fixed flow requires a profile",
        ));
    }

    let has_capacity = spec.nominal_value.is_some() || spec.investment.is_some();
    if spec.profile.is_some() && !has_capacity {
        return Err(GraphError::AmbiguousCapacity {
            owner: label,
            reason: "profile given without nominal value or investment",
        });
    }
    if spec.nominal_value.is_some() && spec.investment.is_some() {
        return Err(GraphError::AmbiguousCapacity {
            owner: label,
            reason: "both nominal value and investment given",
        });
    }
    Ok(())
}

fn validate_profile(graph: &Graph, label: &str, profile: &Profile) -> GraphResult<()> {
    let expected = graph.horizon().len();
    if let Some(actual) = profile.len() {
        if actual != expected {
            return Err(GraphError::ProfileLength {
                flow: label.to_string(),
                expected,
                actual,
            });
        }
    }
    for (t, value) in profile.values().enumerate() {
        finite_non_negative(|| format!("profile of '{label}' at timestep {t}"), value)?;
    }
    Ok(())
}

fn validate_topology(graph: &Graph, node: &Node) -> GraphResult<()> {
    let mut seen = HashSet::new();
    for flow_id in node.inputs.iter().chain(&node.outputs) {
        let flow = &graph.flows()[flow_id.idx()];
        if !seen.insert((flow.bus, flow.direction)) {
            return Err(GraphError::InvalidTopology {
                node: node.label.clone(),
                reason: format!(
                    "flow {} is registered twice",
                    graph.flow_label(flow.id)
                ),
            });
        }
    }

    let reason = match &node.kind {
        NodeKind::Source if node.outputs.is_empty() => Some("source needs at least one output"),
        NodeKind::Sink if node.inputs.is_empty() => Some("sink needs at least one input"),
        NodeKind::Converter { .. } if node.inputs.is_empty() || node.outputs.is_empty() => {
            Some("converter needs at least one input and one output")
        }
        NodeKind::Storage(_) if node.inputs.len() != 1 || node.outputs.len() != 1 => {
            Some("storage needs exactly one input and one output")
        }
        _ => None,
    };
    match reason {
        Some(reason) => Err(GraphError::InvalidTopology {
            node: node.label.clone(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn validate_converter(graph: &Graph, node: &Node, factors: &[(BusId, f64)]) -> GraphResult<()> {
    let fail = |reason: String| GraphError::ConversionFactors {
        converter: node.label.clone(),
        reason,
    };
    let bus_label = |bus: BusId| graph.bus(bus).map_or("?", |b| b.label.as_str()).to_string();

    let mut connected = HashSet::new();
    for flow_id in node.inputs.iter().chain(&node.outputs) {
        let bus = graph.flows()[flow_id.idx()].bus;
        if !connected.insert(bus) {
            return Err(GraphError::InvalidTopology {
                node: node.label.clone(),
                reason: format!("bus '{}' connected more than once", bus_label(bus)),
            });
        }
    }

    let mut seen = HashSet::new();
    for &(bus, factor) in factors {
        if !seen.insert(bus) {
            return Err(fail(format!("bus '{}' listed twice", bus_label(bus))));
        }
        if !connected.contains(&bus) {
            return Err(fail(format!("bus '{}' is not connected", bus_label(bus))));
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(fail(format!(
                "factor {factor} for bus '{}' must be finite and positive",
                bus_label(bus)
            )));
        }
    }
    if let Some(missing) = connected.iter().find(|b| !seen.contains(*b)) {
        return Err(fail(format!("no factor for bus '{}'", bus_label(*missing))));
    }
    Ok(())
}

fn validate_storage(label: &str, params: &StorageParams) -> GraphResult<()> {
    match (params.nominal_capacity, &params.investment) {
        (None, None) => {
            return Err(GraphError::AmbiguousCapacity {
                owner: label.to_string(),
                reason: "storage has neither capacity nor investment",
            });
        }
        (Some(_), Some(_)) => {
            return Err(GraphError::AmbiguousCapacity {
                owner: label.to_string(),
                reason: "both storage capacity and investment given",
            });
        }
        (Some(capacity), None) => {
            finite_non_negative(|| format!("capacity of '{label}'"), capacity)?;
            if params.initial_level > capacity {
                return Err(GraphError::invalid(
                    format!("initial level of '{label}'"),
                    params.initial_level,
                    "exceeds capacity",
                ));
            }
        }
        (None, Some(inv)) => {
            if !inv.ep_costs.is_finite() {
                return Err(GraphError::invalid(
                    format!("investment cost of '{label}'"),
                    inv.ep_costs,
                    "not finite",
                ));
            }
        }
    }

    finite_non_negative(|| format!("initial level of '{label}'"), params.initial_level)?;
    if !(0.0..=1.0).contains(&params.loss_rate) {
        return Err(GraphError::invalid(
            format!("loss rate of '{label}'"),
            params.loss_rate,
            "must be within [0, 1]",
        ));
    }
    for (what, eff) in [
        ("charge efficiency", params.charge_efficiency),
        ("discharge efficiency", params.discharge_efficiency),
    ] {
        if !(eff > 0.0 && eff <= 1.0) {
            return Err(GraphError::invalid(
                format!("{what} of '{label}'"),
                eff,
                "must be within (0, 1]",
            ));
        }
    }
    Ok(())
}
