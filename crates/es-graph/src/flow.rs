//! Flows: directed, capacity- and cost-bearing edges between a node and a bus.

use es_core::{BusId, FlowId, NodeId};
use serde::{Deserialize, Serialize};

/// A value that is either the same for every timestep or given per timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Profile {
    Constant(f64),
    Series(Vec<f64>),
}

impl Profile {
    /// Value at timestep `t`. Series are length-checked at build time.
    pub fn value_at(&self, t: usize) -> f64 {
        match self {
            Profile::Constant(v) => *v,
            Profile::Series(values) => values[t],
        }
    }

    /// Number of explicit values, `None` for a constant.
    pub fn len(&self) -> Option<usize> {
        match self {
            Profile::Constant(_) => None,
            Profile::Series(values) => Some(values.len()),
        }
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Profile::Constant(v) => Box::new(std::iter::once(*v)),
            Profile::Series(values) => Box::new(values.iter().copied()),
        }
    }
}

impl From<f64> for Profile {
    fn from(v: f64) -> Self {
        Profile::Constant(v)
    }
}

impl From<Vec<f64>> for Profile {
    fn from(values: Vec<f64>) -> Self {
        Profile::Series(values)
    }
}

/// Capacity expansion attached to a flow or a storage.
///
/// `ep_costs` is the annualised cost per unit of added capacity.
/// `maximum` bounds the added capacity (`None` = unbounded) and `existing`
/// is capacity already installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub ep_costs: f64,
    pub maximum: Option<f64>,
    pub existing: f64,
}

impl Investment {
    pub fn new(ep_costs: f64) -> Self {
        Self {
            ep_costs,
            maximum: None,
            existing: 0.0,
        }
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn existing(mut self, existing: f64) -> Self {
        self.existing = existing;
        self
    }
}

/// User-facing flow attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    pub nominal_value: Option<f64>,
    pub profile: Option<Profile>,
    pub fixed: bool,
    pub variable_cost: f64,
    pub investment: Option<Investment>,
}

impl Default for FlowSpec {
    fn default() -> Self {
        Self {
            nominal_value: None,
            profile: None,
            fixed: false,
            variable_cost: 0.0,
            investment: None,
        }
    }
}

impl FlowSpec {
    /// A free flow with no capacity limit and no cost.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nominal_value(mut self, value: f64) -> Self {
        self.nominal_value = Some(value);
        self
    }

    /// Pin the flow to `profile[t] * capacity`.
    pub fn fixed(mut self, profile: impl Into<Profile>) -> Self {
        self.profile = Some(profile.into());
        self.fixed = true;
        self
    }

    /// Upper bound of `profile[t] * capacity` for a free flow.
    pub fn max_profile(mut self, profile: impl Into<Profile>) -> Self {
        self.profile = Some(profile.into());
        self.fixed = false;
        self
    }

    pub fn variable_cost(mut self, cost: f64) -> Self {
        self.variable_cost = cost;
        self
    }

    pub fn investment(mut self, investment: Investment) -> Self {
        self.investment = Some(investment);
        self
    }

    /// Profile factor at `t`, 1.0 when no profile is set.
    pub fn factor_at(&self, t: usize) -> f64 {
        self.profile.as_ref().map_or(1.0, |p| p.value_at(t))
    }

    /// True when the flow has no nominal value, no investment and no profile.
    pub fn is_unbounded(&self) -> bool {
        self.nominal_value.is_none() && self.investment.is_none() && self.profile.is_none()
    }
}

/// Direction of a flow relative to its bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    /// The node feeds the bus (node output).
    NodeToBus,
    /// The bus feeds the node (node input).
    BusToNode,
}

/// A registered flow: plain edge record between a node and a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub id: FlowId,
    pub node: NodeId,
    pub bus: BusId,
    pub direction: FlowDirection,
    pub spec: FlowSpec,
}

impl Flow {
    pub fn is_bus_inflow(&self) -> bool {
        self.direction == FlowDirection::NodeToBus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_profile_applies_everywhere() {
        let p = Profile::from(0.5);
        assert_eq!(p.value_at(0), 0.5);
        assert_eq!(p.value_at(8783), 0.5);
        assert_eq!(p.len(), None);
    }

    #[test]
    fn series_profile_indexes_by_step() {
        let p = Profile::from(vec![0.1, 0.2, 0.3]);
        assert_eq!(p.value_at(2), 0.3);
        assert_eq!(p.len(), Some(3));
        assert_eq!(p.values().count(), 3);
    }

    #[test]
    fn flow_spec_builders() {
        let spec = FlowSpec::new()
            .nominal_value(3.0)
            .variable_cost(9.12)
            .max_profile(vec![1.0, 0.5]);
        assert_eq!(spec.nominal_value, Some(3.0));
        assert!(!spec.fixed);
        assert_eq!(spec.factor_at(1), 0.5);
        assert!(!spec.is_unbounded());

        let fixed = FlowSpec::new().nominal_value(1.0).fixed(2.11);
        assert!(fixed.fixed);
        assert_eq!(fixed.factor_at(0), 2.11);

        assert!(FlowSpec::new().is_unbounded());
        assert_eq!(FlowSpec::new().factor_at(4), 1.0);
    }

    #[test]
    fn investment_builder() {
        let inv = Investment::new(120.0).maximum(50.0).existing(10.0);
        assert_eq!(inv.maximum, Some(50.0));
        assert_eq!(inv.existing, 10.0);
    }
}
