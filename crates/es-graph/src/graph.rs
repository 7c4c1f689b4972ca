//! Core graph data structures.

use es_core::{BusId, FlowId, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::flow::{Flow, FlowDirection, Investment};
use crate::horizon::TimeHorizon;
use crate::indexing::{EntityRef, LabelIndex};

/// Conservation node for one commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bus {
    pub id: BusId,
    pub label: String,
}

/// Storage attributes.
///
/// Capacity is either `nominal_capacity` or decided by `investment`.
/// `initial_level` is absolute. `loss_rate` is the fraction lost per
/// timestep; efficiencies apply on charge and discharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageParams {
    pub nominal_capacity: Option<f64>,
    pub investment: Option<Investment>,
    pub initial_level: f64,
    pub loss_rate: f64,
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    /// Level at the last timestep must return to `initial_level`.
    pub balanced: bool,
}

impl StorageParams {
    fn lossless() -> Self {
        Self {
            nominal_capacity: None,
            investment: None,
            initial_level: 0.0,
            loss_rate: 0.0,
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            balanced: false,
        }
    }

    pub fn with_capacity(capacity: f64) -> Self {
        Self {
            nominal_capacity: Some(capacity),
            ..Self::lossless()
        }
    }

    pub fn investable(investment: Investment) -> Self {
        Self {
            investment: Some(investment),
            ..Self::lossless()
        }
    }

    pub fn initial_level(mut self, level: f64) -> Self {
        self.initial_level = level;
        self
    }

    pub fn loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate;
        self
    }

    pub fn efficiencies(mut self, charge: f64, discharge: f64) -> Self {
        self.charge_efficiency = charge;
        self.discharge_efficiency = discharge;
        self
    }

    pub fn balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Source,
    Sink,
    /// Factor per connected bus.
    Converter { conversion_factors: Vec<(BusId, f64)> },
    Storage(StorageParams),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Source => "source",
            NodeKind::Sink => "sink",
            NodeKind::Converter { .. } => "converter",
            NodeKind::Storage(_) => "storage",
        }
    }
}

/// A source, sink, converter or storage with its attached flows.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    /// Flows from a bus into this node, in registration order.
    pub inputs: Vec<FlowId>,
    /// Flows from this node into a bus, in registration order.
    pub outputs: Vec<FlowId>,
}

impl Node {
    pub fn conversion_factor(&self, bus: BusId) -> Option<f64> {
        match &self.kind {
            NodeKind::Converter { conversion_factors } => conversion_factors
                .iter()
                .find(|(b, _)| *b == bus)
                .map(|(_, f)| *f),
            _ => None,
        }
    }

    pub fn storage(&self) -> Option<&StorageParams> {
        match &self.kind {
            NodeKind::Storage(params) => Some(params),
            _ => None,
        }
    }
}

/// Flows attached to one bus.
#[derive(Debug, Clone, Copy)]
pub struct BusFlows<'a> {
    /// Flows delivering into the bus.
    pub inflows: &'a [FlowId],
    /// Flows drawing from the bus.
    pub outflows: &'a [FlowId],
}

/// The graph: a validated, immutable energy-system snapshot.
///
/// Buses, nodes and flows live in arenas indexed by their ids. Bus adjacency
/// is stored compactly (offsets + flat lists) in registration order so that
/// constraint generation is deterministic.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) horizon: TimeHorizon,
    pub(crate) buses: Vec<Bus>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) flows: Vec<Flow>,
    pub(crate) labels: LabelIndex,

    /// Bus i's inflows are in bus_inflows[bus_in_offsets[i]..bus_in_offsets[i+1]].
    pub(crate) bus_in_offsets: Vec<usize>,
    pub(crate) bus_inflows: Vec<FlowId>,
    pub(crate) bus_out_offsets: Vec<usize>,
    pub(crate) bus_outflows: Vec<FlowId>,
}

impl Graph {
    pub fn horizon(&self) -> &TimeHorizon {
        &self.horizon
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses.get(id.idx())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(id.idx())
    }

    pub fn bus_inflows(&self, bus: BusId) -> &[FlowId] {
        let idx = bus.idx();
        if idx >= self.buses.len() {
            return &[];
        }
        &self.bus_inflows[self.bus_in_offsets[idx]..self.bus_in_offsets[idx + 1]]
    }

    pub fn bus_outflows(&self, bus: BusId) -> &[FlowId] {
        let idx = bus.idx();
        if idx >= self.buses.len() {
            return &[];
        }
        &self.bus_outflows[self.bus_out_offsets[idx]..self.bus_out_offsets[idx + 1]]
    }

    /// Ordered incoming and outgoing flows of a bus.
    pub fn bus_flows(&self, bus: BusId) -> BusFlows<'_> {
        BusFlows {
            inflows: self.bus_inflows(bus),
            outflows: self.bus_outflows(bus),
        }
    }

    /// Every bus with its flows, in registration order.
    pub fn traverse_buses(&self) -> impl Iterator<Item = (&Bus, BusFlows<'_>)> {
        self.buses.iter().map(|b| (b, self.bus_flows(b.id)))
    }

    /// Source and target labels of a flow.
    pub fn flow_endpoints(&self, flow: &Flow) -> (&str, &str) {
        let node = self.nodes[flow.node.idx()].label.as_str();
        let bus = self.buses[flow.bus.idx()].label.as_str();
        match flow.direction {
            FlowDirection::NodeToBus => (node, bus),
            FlowDirection::BusToNode => (bus, node),
        }
    }

    /// `from->to` label of a flow.
    pub fn flow_label(&self, id: FlowId) -> String {
        match self.flow(id) {
            Some(flow) => {
                let (from, to) = self.flow_endpoints(flow);
                format!("{from}->{to}")
            }
            None => format!("flow#{id}"),
        }
    }

    /// Flows attached to a labelled bus or node.
    ///
    /// Buses list inflows before outflows; nodes list inputs before outputs.
    pub fn flows_of(&self, label: &str) -> GraphResult<Vec<FlowId>> {
        match self.labels.resolve(label)? {
            EntityRef::Bus(bus) => {
                let flows = self.bus_flows(bus);
                Ok(flows
                    .inflows
                    .iter()
                    .chain(flows.outflows)
                    .copied()
                    .collect())
            }
            EntityRef::Node(node) => {
                let node = self.node(node).ok_or_else(|| GraphError::UnknownLabel {
                    label: label.to_string(),
                })?;
                Ok(node.inputs.iter().chain(&node.outputs).copied().collect())
            }
        }
    }

    pub fn storages(&self) -> impl Iterator<Item = (&Node, &StorageParams)> {
        self.nodes
            .iter()
            .filter_map(|n| n.storage().map(|params| (n, params)))
    }
}
