//! Graph-specific error types.

use es_core::EsError;
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Structural errors, detected before any LP is assembled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A bus or node label collides with an existing one.
    #[error("Duplicate label: '{label}'")]
    DuplicateLabel { label: String },

    /// A flow names a bus that has not been registered.
    #[error("'{referenced_by}' refers to unregistered bus '{bus}'")]
    DanglingReference { referenced_by: String, bus: String },

    /// A profile does not cover the time horizon exactly.
    #[error("Profile of flow '{flow}' has {actual} values, horizon has {expected} timesteps")]
    ProfileLength {
        flow: String,
        expected: usize,
        actual: usize,
    },

    /// Converter factors do not match the buses the converter connects.
    #[error("Conversion factors of '{converter}': {reason}")]
    ConversionFactors { converter: String, reason: String },

    /// A node has the wrong number or kind of flows.
    #[error("Invalid topology at '{node}': {reason}")]
    InvalidTopology { node: String, reason: String },

    /// A numeric attribute is outside its domain.
    #[error("Invalid value for {what}: {value} ({reason})")]
    InvalidValue {
        what: String,
        value: f64,
        reason: &'static str,
    },

    /// Capacity cannot be derived unambiguously.
    #[error("Ambiguous capacity for '{owner}': {reason}")]
    AmbiguousCapacity { owner: String, reason: &'static str },

    /// The horizon has no timesteps.
    #[error("Time horizon is empty")]
    EmptyHorizon,

    /// A label lookup failed.
    #[error("Unknown label: '{label}'")]
    UnknownLabel { label: String },
}

impl GraphError {
    pub(crate) fn invalid(what: impl Into<String>, value: f64, reason: &'static str) -> Self {
        GraphError::InvalidValue {
            what: what.into(),
            value,
            reason,
        }
    }
}

impl GraphError {
    /// Attach a label to a failed numeric check.
    pub(crate) fn numeric(what: String, err: EsError) -> Self {
        match err {
            EsError::NonFinite { value, .. } => GraphError::invalid(what, value, "not finite"),
            EsError::Negative { value, .. } => GraphError::invalid(what, value, "negative"),
        }
    }
}
