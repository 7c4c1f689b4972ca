//! Result extraction from a solved model.

use es_core::{FlowId, VarId};
use es_graph::{EntityRef, GraphError, Investment};
use es_solver::{SolveOutcome, SolveStatus};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelStats};

/// Values of one flow over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSeries {
    pub from: String,
    pub to: String,
    /// `(timestep, value)` in timestep order.
    pub values: Vec<(usize, f64)>,
}

impl FlowSeries {
    pub fn label(&self) -> String {
        format!("{}->{}", self.from, self.to)
    }

    pub fn value_at(&self, t: usize) -> Option<f64> {
        self.values.get(t).map(|(_, v)| *v)
    }
}

/// Capacity decided by the optimisation for one investable flow or storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    /// `from->to` for flows, the node label for storages.
    pub owner: String,
    pub added: f64,
    pub existing: f64,
}

impl InvestmentResult {
    pub fn total(&self) -> f64 {
        self.existing + self.added
    }
}

/// Run summary: solver status, objective and problem size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaResults {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub solver: String,
    pub solve_time_s: f64,
    pub stats: ModelStats,
}

/// A model together with the solver's outcome.
#[derive(Debug)]
pub struct SolvedModel<'a> {
    model: &'a Model<'a>,
    outcome: SolveOutcome,
}

impl<'a> SolvedModel<'a> {
    pub(crate) fn new(model: &'a Model<'a>, outcome: SolveOutcome) -> Self {
        Self { model, outcome }
    }

    pub fn model(&self) -> &'a Model<'a> {
        self.model
    }

    pub fn outcome(&self) -> &SolveOutcome {
        &self.outcome
    }

    pub fn status(&self) -> SolveStatus {
        self.outcome.status
    }

    pub fn objective(&self) -> Option<f64> {
        self.outcome.objective
    }

    fn values(&self) -> ModelResult<&[f64]> {
        if self.outcome.status.is_optimal()
            && self.outcome.values.len() == self.model.problem().num_vars()
        {
            Ok(&self.outcome.values)
        } else {
            Err(ModelError::NoSolution {
                status: self.outcome.status,
            })
        }
    }

    /// Values of one flow, one per timestep.
    pub fn flow_values(&self, flow: FlowId) -> ModelResult<Vec<f64>> {
        let values = self.values()?;
        Ok(values[self.model.vars().flow_columns(flow)].to_vec())
    }

    fn series(&self, flow: FlowId) -> ModelResult<FlowSeries> {
        let graph = self.model.graph();
        let record = graph.flow(flow).ok_or_else(|| GraphError::UnknownLabel {
            label: format!("flow#{flow}"),
        })?;
        let (from, to) = graph.flow_endpoints(record);
        Ok(FlowSeries {
            from: from.to_string(),
            to: to.to_string(),
            values: self.flow_values(flow)?.into_iter().enumerate().collect(),
        })
    }

    /// Series of every flow attached to a bus or node.
    ///
    /// Bus inflows come before outflows; node inputs before outputs.
    pub fn values_for(&self, label: &str) -> ModelResult<Vec<FlowSeries>> {
        self.model
            .graph()
            .flows_of(label)?
            .into_iter()
            .map(|f| self.series(f))
            .collect()
    }

    /// Series of every flow in registration order.
    pub fn all_flows(&self) -> ModelResult<Vec<FlowSeries>> {
        self.model
            .graph()
            .flows()
            .iter()
            .map(|f| self.series(f.id))
            .collect()
    }

    /// Storage level per timestep.
    pub fn storage_levels(&self, label: &str) -> ModelResult<Vec<f64>> {
        let values = self.values()?;
        let graph = self.model.graph();
        let not_storage = || ModelError::NotAStorage {
            label: label.to_string(),
        };
        let EntityRef::Node(node) = graph.labels().resolve(label)? else {
            return Err(not_storage());
        };
        let steps = graph.horizon().len();
        (0..steps)
            .map(|t| {
                self.model
                    .vars()
                    .storage_level(node, t)
                    .map(|v| values[v.idx()])
                    .ok_or_else(not_storage)
            })
            .collect()
    }

    /// Levels of every storage, keyed by label.
    pub fn all_storage_levels(&self) -> ModelResult<Vec<(String, Vec<f64>)>> {
        self.model
            .graph()
            .storages()
            .map(|(node, _)| Ok((node.label.clone(), self.storage_levels(&node.label)?)))
            .collect()
    }

    fn investment_result(
        &self,
        owner: String,
        var: VarId,
        inv: &Investment,
    ) -> ModelResult<InvestmentResult> {
        let values = self.values()?;
        Ok(InvestmentResult {
            owner,
            added: values[var.idx()],
            existing: inv.existing,
        })
    }

    /// Added capacity of the investable flows attached to `label`, and of
    /// `label` itself when it is an investable storage.
    pub fn invested_capacity(&self, label: &str) -> ModelResult<Vec<InvestmentResult>> {
        let graph = self.model.graph();
        let vars = self.model.vars();
        let mut out = Vec::new();

        if let EntityRef::Node(node) = graph.labels().resolve(label)? {
            let params = graph.node(node).and_then(|n| n.storage());
            if let (Some(var), Some(inv)) = (
                vars.storage_investment(node),
                params.and_then(|p| p.investment.as_ref()),
            ) {
                out.push(self.investment_result(label.to_string(), var, inv)?);
            }
        }
        for flow_id in graph.flows_of(label)? {
            let flow = &graph.flows()[flow_id.idx()];
            if let (Some(var), Some(inv)) = (vars.flow_investment(flow_id), &flow.spec.investment) {
                out.push(self.investment_result(graph.flow_label(flow_id), var, inv)?);
            }
        }
        Ok(out)
    }

    /// Every investment decision in the model.
    pub fn investments(&self) -> ModelResult<Vec<InvestmentResult>> {
        let graph = self.model.graph();
        let vars = self.model.vars();
        let mut out = Vec::new();
        for flow in graph.flows() {
            if let (Some(var), Some(inv)) = (vars.flow_investment(flow.id), &flow.spec.investment) {
                out.push(self.investment_result(graph.flow_label(flow.id), var, inv)?);
            }
        }
        for (node, params) in graph.storages() {
            if let (Some(var), Some(inv)) = (vars.storage_investment(node.id), &params.investment) {
                out.push(self.investment_result(node.label.clone(), var, inv)?);
            }
        }
        Ok(out)
    }

    pub fn meta(&self) -> MetaResults {
        MetaResults {
            status: self.outcome.status,
            objective: self.outcome.objective,
            solver: self.outcome.solver.clone(),
            solve_time_s: self.outcome.solve_time_s,
            stats: self.model.stats(),
        }
    }
}
