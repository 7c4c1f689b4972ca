//! Query helpers for stored runs.

use std::collections::BTreeSet;

use es_model::{FlowSeries, InvestmentResult};
use es_results::{RunData, RunManifest};
use es_solver::SolveStatus;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub system_id: String,
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub timesteps: usize,
    pub flow_count: usize,
    pub storage_count: usize,
    pub investment_count: usize,
}

pub fn get_run_summary(manifest: &RunManifest, data: &RunData) -> RunSummary {
    RunSummary {
        run_id: manifest.run_id.clone(),
        system_id: manifest.system_id.clone(),
        status: manifest.meta.status,
        objective: manifest.meta.objective,
        timesteps: manifest.horizon.timesteps,
        flow_count: data.flows.len(),
        storage_count: data.storages.len(),
        investment_count: data.investments.len(),
    }
}

/// Every bus and node label that appears in a flow, sorted.
pub fn list_labels(data: &RunData) -> Vec<String> {
    let labels: BTreeSet<&str> = data
        .flows
        .iter()
        .flat_map(|f| [f.from.as_str(), f.to.as_str()])
        .collect();
    labels.into_iter().map(str::to_string).collect()
}

/// Flows attached to `label`, inflows first.
pub fn node_series(data: &RunData, label: &str) -> AppResult<Vec<FlowSeries>> {
    let flows = data.flows_of(label);
    if flows.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "no flows attached to '{}'",
            label
        )));
    }
    Ok(flows.into_iter().cloned().collect())
}

pub fn storage_series(data: &RunData, label: &str) -> AppResult<Vec<f64>> {
    data.storage(label)
        .map(|s| s.levels.clone())
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a storage", label)))
}

/// Investments owned by `label` or by one of its flows.
pub fn investments_of<'a>(data: &'a RunData, label: &str) -> Vec<&'a InvestmentResult> {
    let from = format!("{}->", label);
    let to = format!("->{}", label);
    data.investments
        .iter()
        .filter(|i| i.owner == label || i.owner.starts_with(&from) || i.owner.ends_with(&to))
        .collect()
}
