//! Project loading, saving, validation, and introspection.

use std::path::Path;

use es_project::schema::{Project, SystemDef};

use crate::error::{AppError, AppResult};
use crate::system_compile;

/// Summary of a system for listing.
#[derive(Debug, Clone)]
pub struct SystemSummary {
    pub id: String,
    pub name: String,
    pub timesteps: usize,
    pub bus_count: usize,
    pub node_count: usize,
    pub flow_count: usize,
    pub storage_count: usize,
}

/// Load a YAML or JSON project, migrated and schema-validated.
pub fn load_project(path: &Path) -> AppResult<Project> {
    Ok(es_project::load_project(path)?)
}

pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(es_project::save_project(path, project)?)
}

/// Schema validation plus a full graph build of every system.
///
/// `project_path` anchors CSV profile files.
pub fn validate_project(project_path: &Path, project: &Project) -> AppResult<()> {
    es_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))?;
    for system in &project.systems {
        system_compile::build_graph(system, project_path).map_err(|e| {
            AppError::Validation(format!("system '{}': {}", system.id, e))
        })?;
    }
    Ok(())
}

/// List all systems in the project with summaries.
pub fn list_systems(project: &Project) -> Vec<SystemSummary> {
    project
        .systems
        .iter()
        .map(|system| SystemSummary {
            id: system.id.clone(),
            name: system.name.clone(),
            timesteps: system.horizon.timesteps,
            bus_count: system.buses.len(),
            node_count: system.node_labels().count(),
            flow_count: system.flows().count(),
            storage_count: system.storages.len(),
        })
        .collect()
}

/// Get a specific system by ID.
pub fn get_system<'a>(project: &'a Project, system_id: &str) -> AppResult<&'a SystemDef> {
    project
        .systems
        .iter()
        .find(|s| s.id == system_id)
        .ok_or_else(|| AppError::SystemNotFound(system_id.to_string()))
}
