//! Variable registry shared by the constraint builders.

use es_core::{FlowId, Id, NodeId, VarId};
use es_graph::Graph;

/// Maps graph entities to LP columns.
///
/// Each flow owns one column per timestep, allocated contiguously, so a flow
/// is represented by the column of its first timestep. Storage levels use the
/// same layout.
#[derive(Debug, Clone)]
pub struct VarIndex {
    timesteps: usize,
    pub(crate) flow_base: Vec<VarId>,
    pub(crate) flow_invest: Vec<Option<VarId>>,
    pub(crate) storage_base: Vec<Option<VarId>>,
    pub(crate) storage_invest: Vec<Option<VarId>>,
}

impl VarIndex {
    pub(crate) fn new(graph: &Graph) -> Self {
        Self {
            timesteps: graph.horizon().len(),
            flow_base: Vec::with_capacity(graph.flows().len()),
            flow_invest: vec![None; graph.flows().len()],
            storage_base: vec![None; graph.nodes().len()],
            storage_invest: vec![None; graph.nodes().len()],
        }
    }

    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Column of `flow` at timestep `t`.
    pub fn flow(&self, flow: FlowId, t: usize) -> VarId {
        Id::from_usize(self.flow_base[flow.idx()].idx() + t)
    }

    pub fn flow_columns(&self, flow: FlowId) -> std::ops::Range<usize> {
        let base = self.flow_base[flow.idx()].idx();
        base..base + self.timesteps
    }

    pub fn flow_investment(&self, flow: FlowId) -> Option<VarId> {
        self.flow_invest.get(flow.idx()).copied().flatten()
    }

    pub fn storage_level(&self, node: NodeId, t: usize) -> Option<VarId> {
        let base = self.storage_base.get(node.idx()).copied().flatten()?;
        Some(Id::from_usize(base.idx() + t))
    }

    pub fn storage_investment(&self, node: NodeId) -> Option<VarId> {
        self.storage_invest.get(node.idx()).copied().flatten()
    }
}
