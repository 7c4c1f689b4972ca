//! Parallel runs of several systems.
//!
//! Each worker compiles and solves its own graph; runs share only the
//! project definition and the run store directory.

use std::path::Path;

use es_solver::GoodLpSolver;
use rayon::prelude::*;
use tracing::info;

use crate::error::AppResult;
use crate::project_service;
use crate::run_service::{self, RunOptions, RunResponse};

/// Result of one system in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub system_id: String,
    pub result: AppResult<RunResponse>,
}

/// Run `system_ids` (all systems when empty) in parallel.
///
/// Fails only when the project cannot be loaded or an id is unknown;
/// per-system failures are reported in the items, in input order.
pub fn run_all(
    project_path: &Path,
    system_ids: &[String],
    options: &RunOptions,
) -> AppResult<Vec<BatchItem>> {
    let project = project_service::load_project(project_path)?;
    let systems = if system_ids.is_empty() {
        project.systems.iter().collect::<Vec<_>>()
    } else {
        system_ids
            .iter()
            .map(|id| project_service::get_system(&project, id))
            .collect::<AppResult<Vec<_>>>()?
    };

    info!(systems = systems.len(), "Starting batch run");
    let solver = GoodLpSolver::new();
    let items = systems
        .par_iter()
        .map(|system| BatchItem {
            system_id: system.id.clone(),
            result: run_service::run_system(project_path, system, options, &solver, None),
        })
        .collect();
    Ok(items)
}
