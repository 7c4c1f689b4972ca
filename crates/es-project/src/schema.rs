//! Project schema definitions.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub systems: Vec<SystemDef>,
}

/// One energy system over one time horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    pub id: String,
    pub name: String,
    pub horizon: HorizonDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_weighting: Option<Vec<f64>>,
    #[serde(default)]
    pub buses: Vec<BusDef>,
    #[serde(default)]
    pub sources: Vec<SourceDef>,
    #[serde(default)]
    pub sinks: Vec<SinkDef>,
    #[serde(default)]
    pub converters: Vec<ConverterDef>,
    #[serde(default)]
    pub storages: Vec<StorageDef>,
    /// Version 1 name of `converters`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformers: Vec<ConverterDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizonDef {
    pub timesteps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDateTime>,
    #[serde(default = "default_step_hours")]
    pub step_hours: f64,
    /// Per-step duration weights; uniform 1.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<f64>>,
}

fn default_step_hours() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusDef {
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDef {
    pub label: String,
    pub outputs: Vec<FlowDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkDef {
    pub label: String,
    pub inputs: Vec<FlowDef>,
}

/// Converter. Buses missing from `conversion_factors` default to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConverterDef {
    pub label: String,
    #[serde(default)]
    pub inputs: Vec<FlowDef>,
    #[serde(default)]
    pub outputs: Vec<FlowDef>,
    #[serde(default)]
    pub conversion_factors: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageDef {
    pub label: String,
    pub input: FlowDef,
    pub output: FlowDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<InvestmentDef>,
    #[serde(default)]
    pub initial_level: f64,
    #[serde(default)]
    pub loss_rate: f64,
    #[serde(default = "default_efficiency")]
    pub charge_efficiency: f64,
    #[serde(default = "default_efficiency")]
    pub discharge_efficiency: f64,
    #[serde(default)]
    pub balanced: bool,
}

fn default_efficiency() -> f64 {
    1.0
}

/// A flow between a node and `bus`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowDef {
    pub bus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileDef>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub variable_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<InvestmentDef>,
}

impl FlowDef {
    pub fn to_bus(bus: impl Into<String>) -> Self {
        Self {
            bus: bus.into(),
            nominal_value: None,
            profile: None,
            fixed: false,
            variable_cost: 0.0,
            investment: None,
        }
    }
}

/// A scalar, an inline series, or a column of a CSV file relative to the
/// project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProfileDef {
    Constant(f64),
    Series(Vec<f64>),
    Column { file: String, column: String },
}

/// `ep_costs` is the annualised cost per unit of added capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentDef {
    pub ep_costs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub existing: f64,
}

impl SystemDef {
    /// Labels of all nodes, in declaration order.
    pub fn node_labels(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .map(|s| s.label.as_str())
            .chain(self.sinks.iter().map(|s| s.label.as_str()))
            .chain(self.converters.iter().map(|c| c.label.as_str()))
            .chain(self.storages.iter().map(|s| s.label.as_str()))
    }

    /// Every flow with the label of its node.
    pub fn flows(&self) -> impl Iterator<Item = (&str, &FlowDef)> {
        let sources = self
            .sources
            .iter()
            .flat_map(|s| s.outputs.iter().map(move |f| (s.label.as_str(), f)));
        let sinks = self
            .sinks
            .iter()
            .flat_map(|s| s.inputs.iter().map(move |f| (s.label.as_str(), f)));
        let converters = self.converters.iter().flat_map(|c| {
            c.inputs
                .iter()
                .chain(&c.outputs)
                .map(move |f| (c.label.as_str(), f))
        });
        let storages = self
            .storages
            .iter()
            .flat_map(|s| [(s.label.as_str(), &s.input), (s.label.as_str(), &s.output)]);
        sources.chain(sinks).chain(converters).chain(storages)
    }
}
