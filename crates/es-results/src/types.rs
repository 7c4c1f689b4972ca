//! Stored run records.

use chrono::{Duration, NaiveDateTime};
use es_model::{FlowSeries, InvestmentResult, MetaResults};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub system_id: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub solver_version: String,
    pub horizon: StoredHorizon,
    pub meta: MetaResults,
}

/// Enough of the horizon to label exported rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHorizon {
    pub timesteps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDateTime>,
    pub step_hours: f64,
}

impl StoredHorizon {
    /// Wall-clock time of step `t`, when the horizon has a start.
    pub fn timestamp(&self, t: usize) -> Option<NaiveDateTime> {
        let start = self.start?;
        let seconds = (self.step_hours * 3600.0 * t as f64).round() as i64;
        start.checked_add_signed(Duration::seconds(seconds))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub label: String,
    pub levels: Vec<f64>,
}

/// Everything a solved model produced, detached from the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    pub flows: Vec<FlowSeries>,
    pub storages: Vec<StorageRecord>,
    pub investments: Vec<InvestmentResult>,
}

impl RunData {
    /// Flows into or out of `label`: inflows first, then outflows.
    pub fn flows_of(&self, label: &str) -> Vec<&FlowSeries> {
        let inflows = self.flows.iter().filter(|f| f.to == label);
        let outflows = self.flows.iter().filter(|f| f.from == label);
        inflows.chain(outflows).collect()
    }

    pub fn storage(&self, label: &str) -> Option<&StorageRecord> {
        self.storages.iter().find(|s| s.label == label)
    }
}
