//! Project validation logic.
//!
//! Checks what can be checked without building the graph: identifiers,
//! references and lengths. Physical consistency of flows and storages is
//! left to graph construction.

use std::collections::HashSet;

use crate::schema::{FlowDef, ProfileDef, Project, SystemDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut system_ids = HashSet::new();
    for system in &project.systems {
        if !system_ids.insert(&system.id) {
            return Err(ValidationError::DuplicateId {
                id: system.id.clone(),
                context: "systems".to_string(),
            });
        }
        validate_system(system)?;
    }
    Ok(())
}

pub fn validate_system(system: &SystemDef) -> Result<(), ValidationError> {
    let context = |what: &str| format!("system {} {}", system.id, what);
    let horizon = &system.horizon;

    if horizon.timesteps == 0 {
        return Err(ValidationError::InvalidValue {
            field: context("horizon.timesteps"),
            value: "0".to_string(),
            reason: "horizon needs at least one timestep".to_string(),
        });
    }
    if !(horizon.step_hours.is_finite() && horizon.step_hours > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: context("horizon.step_hours"),
            value: horizon.step_hours.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if let Some(durations) = &horizon.durations {
        check_len(context("horizon.durations"), durations.len(), horizon.timesteps)?;
    }
    if let Some(weights) = &system.objective_weighting {
        check_len(context("objective_weighting"), weights.len(), horizon.timesteps)?;
    }

    let mut buses = HashSet::new();
    for bus in &system.buses {
        if !buses.insert(bus.label.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: bus.label.clone(),
                context: context("buses"),
            });
        }
    }

    let mut labels = HashSet::new();
    for label in system.node_labels() {
        if buses.contains(label) || !labels.insert(label) {
            return Err(ValidationError::DuplicateId {
                id: label.to_string(),
                context: context("labels"),
            });
        }
    }

    for (node, flow) in system.flows() {
        if !buses.contains(flow.bus.as_str()) {
            return Err(ValidationError::MissingReference {
                id: flow.bus.clone(),
                context: context(&format!("flow of {}", node)),
            });
        }
        validate_profile(&context(&format!("profile of {}", node)), flow, horizon.timesteps)?;
    }

    for converter in &system.converters {
        for key in converter.conversion_factors.keys() {
            let connected = converter
                .inputs
                .iter()
                .chain(&converter.outputs)
                .any(|f| &f.bus == key);
            if !connected {
                return Err(ValidationError::MissingReference {
                    id: key.clone(),
                    context: context(&format!("conversion_factors of {}", converter.label)),
                });
            }
        }
    }

    Ok(())
}

fn validate_profile(field: &str, flow: &FlowDef, timesteps: usize) -> Result<(), ValidationError> {
    match &flow.profile {
        Some(ProfileDef::Series(values)) => check_len(field.to_string(), values.len(), timesteps),
        Some(ProfileDef::Column { file, column }) if file.is_empty() || column.is_empty() => {
            Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: format!("{}:{}", file, column),
                reason: "file and column must be named".to_string(),
            })
        }
        _ => Ok(()),
    }
}

fn check_len(field: String, actual: usize, expected: usize) -> Result<(), ValidationError> {
    if actual != expected {
        return Err(ValidationError::InvalidValue {
            field,
            value: actual.to_string(),
            reason: format!("expected {} entries", expected),
        });
    }
    Ok(())
}
