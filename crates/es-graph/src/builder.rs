//! Incremental graph builder.

use es_core::{BusId, FlowId, Id, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::flow::{Flow, FlowDirection, FlowSpec};
use crate::graph::{Bus, Graph, Node, NodeKind, StorageParams};
use crate::horizon::TimeHorizon;
use crate::indexing::{EntityRef, LabelIndex};
use crate::validate;

/// Builder for constructing a graph incrementally.
///
/// Labels and bus references are checked as entities are registered; a failed
/// registration leaves the builder unchanged. Everything that depends on the
/// horizon or on a node's full set of flows is checked by `build()`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    buses: Vec<Bus>,
    nodes: Vec<Node>,
    flows: Vec<Flow>,
    labels: LabelIndex,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bus and return its id.
    pub fn add_bus(&mut self, label: impl Into<String>) -> GraphResult<BusId> {
        let label = label.into();
        let id = Id::from_usize(self.buses.len());
        self.labels.insert(&label, EntityRef::Bus(id))?;
        self.buses.push(Bus { id, label });
        Ok(id)
    }

    /// Register a source feeding the given buses.
    pub fn add_source(
        &mut self,
        label: impl Into<String>,
        outputs: Vec<(BusId, FlowSpec)>,
    ) -> GraphResult<NodeId> {
        self.add_node(label.into(), NodeKind::Source, Vec::new(), outputs)
    }

    /// Register a sink drawing from the given buses.
    pub fn add_sink(
        &mut self,
        label: impl Into<String>,
        inputs: Vec<(BusId, FlowSpec)>,
    ) -> GraphResult<NodeId> {
        self.add_node(label.into(), NodeKind::Sink, inputs, Vec::new())
    }

    /// Register a converter with one conversion factor per connected bus.
    pub fn add_converter(
        &mut self,
        label: impl Into<String>,
        inputs: Vec<(BusId, FlowSpec)>,
        outputs: Vec<(BusId, FlowSpec)>,
        conversion_factors: Vec<(BusId, f64)>,
    ) -> GraphResult<NodeId> {
        let label = label.into();
        self.check_buses(&label, conversion_factors.iter().map(|(b, _)| *b))?;
        self.add_node(
            label,
            NodeKind::Converter { conversion_factors },
            inputs,
            outputs,
        )
    }

    /// Register a storage with one charging and one discharging flow.
    pub fn add_storage(
        &mut self,
        label: impl Into<String>,
        input: (BusId, FlowSpec),
        output: (BusId, FlowSpec),
        params: StorageParams,
    ) -> GraphResult<NodeId> {
        self.add_node(
            label.into(),
            NodeKind::Storage(params),
            vec![input],
            vec![output],
        )
    }

    /// Look up a registered bus by label.
    ///
    /// `referenced_by` names the entity asking, for the error message.
    pub fn resolve_bus(&self, label: &str, referenced_by: &str) -> GraphResult<BusId> {
        self.labels
            .bus(label)
            .ok_or_else(|| GraphError::DanglingReference {
                referenced_by: referenced_by.to_string(),
                bus: label.to_string(),
            })
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn check_buses(&self, label: &str, buses: impl IntoIterator<Item = BusId>) -> GraphResult<()> {
        for bus in buses {
            if bus.idx() >= self.buses.len() {
                return Err(GraphError::DanglingReference {
                    referenced_by: label.to_string(),
                    bus: format!("bus#{bus}"),
                });
            }
        }
        Ok(())
    }

    fn add_node(
        &mut self,
        label: String,
        kind: NodeKind,
        inputs: Vec<(BusId, FlowSpec)>,
        outputs: Vec<(BusId, FlowSpec)>,
    ) -> GraphResult<NodeId> {
        if self.labels.contains(&label) {
            return Err(GraphError::DuplicateLabel { label });
        }
        self.check_buses(&label, inputs.iter().chain(&outputs).map(|(b, _)| *b))?;

        let id = Id::from_usize(self.nodes.len());
        self.labels.insert(&label, EntityRef::Node(id))?;

        let input_ids = inputs
            .into_iter()
            .map(|(bus, spec)| self.push_flow(id, bus, FlowDirection::BusToNode, spec))
            .collect();
        let output_ids = outputs
            .into_iter()
            .map(|(bus, spec)| self.push_flow(id, bus, FlowDirection::NodeToBus, spec))
            .collect();

        self.nodes.push(Node {
            id,
            label,
            kind,
            inputs: input_ids,
            outputs: output_ids,
        });
        Ok(id)
    }

    fn push_flow(
        &mut self,
        node: NodeId,
        bus: BusId,
        direction: FlowDirection,
        spec: FlowSpec,
    ) -> FlowId {
        let id = Id::from_usize(self.flows.len());
        self.flows.push(Flow {
            id,
            node,
            bus,
            direction,
            spec,
        });
        id
    }

    /// Validate against `horizon` and freeze into an immutable `Graph`.
    pub fn build(self, horizon: TimeHorizon) -> GraphResult<Graph> {
        if horizon.is_empty() {
            return Err(GraphError::EmptyHorizon);
        }

        let (bus_in_offsets, bus_inflows) =
            Self::build_adjacency(&self.buses, &self.flows, FlowDirection::NodeToBus);
        let (bus_out_offsets, bus_outflows) =
            Self::build_adjacency(&self.buses, &self.flows, FlowDirection::BusToNode);

        let graph = Graph {
            horizon,
            buses: self.buses,
            nodes: self.nodes,
            flows: self.flows,
            labels: self.labels,
            bus_in_offsets,
            bus_inflows,
            bus_out_offsets,
            bus_outflows,
        };
        validate::validate_graph(&graph)?;
        Ok(graph)
    }

    /// Offsets + flat list of the flows with `direction` at each bus.
    fn build_adjacency(
        buses: &[Bus],
        flows: &[Flow],
        direction: FlowDirection,
    ) -> (Vec<usize>, Vec<FlowId>) {
        let mut per_bus: Vec<Vec<FlowId>> = vec![Vec::new(); buses.len()];
        for flow in flows.iter().filter(|f| f.direction == direction) {
            per_bus[flow.bus.idx()].push(flow.id);
        }

        let mut offsets = Vec::with_capacity(buses.len() + 1);
        let mut flat = Vec::with_capacity(flows.len());
        offsets.push(0);
        for list in per_bus {
            flat.extend(list);
            offsets.push(flat.len());
        }
        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_ids_in_order() {
        let mut builder = GraphBuilder::new();
        let b0 = builder.add_bus("gas").unwrap();
        let b1 = builder.add_bus("el").unwrap();
        let n0 = builder
            .add_source("rgas", vec![(b0, FlowSpec::new())])
            .unwrap();

        assert_eq!(b0.index(), 0);
        assert_eq!(b1.index(), 1);
        assert_eq!(n0.index(), 0);
        assert_eq!(builder.bus_count(), 2);
        assert_eq!(builder.node_count(), 1);
        assert_eq!(builder.flows.len(), 1);
    }

    #[test]
    fn duplicate_label_across_buses_and_nodes() {
        let mut builder = GraphBuilder::new();
        let el = builder.add_bus("el").unwrap();
        let err = builder.add_sink("el", vec![(el, FlowSpec::new())]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateLabel { label: "el".into() });
        assert_eq!(builder.flows.len(), 0);
    }

    #[test]
    fn dangling_bus_reference_leaves_builder_unchanged() {
        let mut builder = GraphBuilder::new();
        let mut other = GraphBuilder::new();
        other.add_bus("a").unwrap();
        let foreign = other.add_bus("b").unwrap();

        let err = builder
            .add_source("pv", vec![(foreign, FlowSpec::new())])
            .unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference { .. }));
        assert_eq!(builder.node_count(), 0);
        assert!(!builder.labels.contains("pv"));
    }

    #[test]
    fn resolve_bus_by_label() {
        let mut builder = GraphBuilder::new();
        let el = builder.add_bus("el").unwrap();
        assert_eq!(builder.resolve_bus("el", "demand").unwrap(), el);
        let err = builder.resolve_bus("heat", "demand").unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingReference {
                referenced_by: "demand".into(),
                bus: "heat".into()
            }
        );
    }

    #[test]
    fn adjacency_follows_registration_order() {
        let mut builder = GraphBuilder::new();
        let el = builder.add_bus("el").unwrap();
        builder
            .add_source("wind", vec![(el, FlowSpec::new())])
            .unwrap();
        builder.add_source("pv", vec![(el, FlowSpec::new())]).unwrap();
        builder
            .add_sink("demand", vec![(el, FlowSpec::new())])
            .unwrap();

        let graph = builder.build(TimeHorizon::uniform(2)).unwrap();
        let flows = graph.bus_flows(el);
        assert_eq!(flows.inflows.len(), 2);
        assert_eq!(flows.outflows.len(), 1);
        assert_eq!(graph.flow_label(flows.inflows[0]), "wind->el");
        assert_eq!(graph.flow_label(flows.inflows[1]), "pv->el");
        assert_eq!(graph.flow_label(flows.outflows[0]), "el->demand");
    }

    #[test]
    fn empty_horizon_rejected() {
        let builder = GraphBuilder::new();
        assert_eq!(
            builder.build(TimeHorizon::uniform(0)).unwrap_err(),
            GraphError::EmptyHorizon
        );
    }
}
