//! Run execution and caching service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use es_core::timing::PerfStats;
use es_model::{Model, ModelStats, SolvedModel};
use es_project::schema::SystemDef;
use es_results::{RunData, RunManifest, RunStore, StorageRecord, StoredHorizon};
use es_solver::{GoodLpSolver, LpSolver, SolveOptions, SolverChoice};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::project_service;
use crate::system_compile;

/// Options for running systems.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver: SolverChoice,
    pub verbose: bool,
    pub time_limit_s: Option<f64>,
    /// Also write the compiled LP here.
    pub lp_path: Option<PathBuf>,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver: SolverChoice::default(),
            verbose: false,
            time_limit_s: None,
            lp_path: None,
            solver_version: concat!("esflow-", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RunOptions {
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            solver: self.solver,
            verbose: self.verbose,
            time_limit_s: self.time_limit_s,
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub system_id: &'a str,
    pub options: RunOptions,
}

/// Wall time per phase of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub resolve_time_s: f64,
    pub compile_time_s: f64,
    pub lp_write_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

impl RunTimingSummary {
    pub fn perf_stats(&self) -> PerfStats {
        PerfStats {
            resolve_time_s: self.resolve_time_s,
            compile_time_s: self.compile_time_s,
            lp_write_time_s: self.lp_write_time_s,
            solve_time_s: self.solve_time_s,
            save_time_s: self.save_time_s,
            load_time_s: self.load_cache_time_s,
        }
    }
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    system_id: &str,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            system_id,
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    emit_progress(
        &mut progress_cb,
        request.system_id,
        RunStage::LoadingProject,
        started,
        "Loading project",
    );
    let project = project_service::load_project(request.project_path)?;
    let system = project_service::get_system(&project, request.system_id)?;
    run_system(
        request.project_path,
        system,
        &request.options,
        &GoodLpSolver::new(),
        progress_cb,
    )
}

/// Run one system of an already loaded project with `solver`.
///
/// The run id covers the system with its profiles inlined, so editing a
/// referenced CSV file invalidates the cache.
pub fn run_system(
    project_path: &Path,
    system: &SystemDef,
    options: &RunOptions,
    solver: &dyn LpSolver,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();
    let id = system.id.as_str();

    emit_progress(&mut progress_cb, id, RunStage::ResolvingProfiles, started, "Resolving profiles");
    let phase = Instant::now();
    let resolved = system_compile::resolve_profiles(system, project_path)?;
    timing.resolve_time_s = phase.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, id, RunStage::CheckingCache, started, "Checking run cache");
    let solve_options = options.solve_options();
    let run_id = es_results::compute_run_id(&resolved, &solve_options, &options.solver_version);
    let store = RunStore::for_project(project_path)?;

    if options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            id,
            RunStage::LoadingCachedResult,
            started,
            "Loading cached run",
        );
        let phase = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = phase.elapsed().as_secs_f64();

        // A cached run skips compilation, but a requested LP file is still written.
        if let Some(lp_path) = &options.lp_path {
            emit_progress(&mut progress_cb, id, RunStage::Compiling, started, "Compiling model");
            let phase = Instant::now();
            let graph = system_compile::compile_system(&resolved)?;
            let model = Model::compile(&graph, &system_compile::compile_options(&resolved))?;
            timing.compile_time_s = phase.elapsed().as_secs_f64();

            emit_progress(&mut progress_cb, id, RunStage::WritingLp, started, "Writing LP file");
            let phase = Instant::now();
            model.write_lp(lp_path)?;
            timing.lp_write_time_s = phase.elapsed().as_secs_f64();
        }
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(system = id, run_id = %run_id, "Loaded cached run");
        emit_progress(&mut progress_cb, id, RunStage::Completed, started, "Loaded cached run");
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    emit_progress(&mut progress_cb, id, RunStage::Compiling, started, "Compiling model");
    let phase = Instant::now();
    let graph = system_compile::compile_system(&resolved)?;
    let model = Model::compile(&graph, &system_compile::compile_options(&resolved))?;
    timing.compile_time_s = phase.elapsed().as_secs_f64();

    if let Some(lp_path) = &options.lp_path {
        emit_progress(&mut progress_cb, id, RunStage::WritingLp, started, "Writing LP file");
        let phase = Instant::now();
        model.write_lp(lp_path)?;
        timing.lp_write_time_s = phase.elapsed().as_secs_f64();
    }

    emit_progress(&mut progress_cb, id, RunStage::Solving, started, "Solving");
    let phase = Instant::now();
    let solved = model.solve(solver, &solve_options)?;
    timing.solve_time_s = phase.elapsed().as_secs_f64();

    let data = if solved.status().is_optimal() {
        extract_run_data(&solved)?
    } else {
        warn!(system = id, status = %solved.status(), "No optimal solution; storing status only");
        RunData::default()
    };

    let manifest = RunManifest {
        run_id: run_id.clone(),
        system_id: system.id.clone(),
        timestamp: Utc::now().to_rfc3339(),
        solver_version: options.solver_version.clone(),
        horizon: StoredHorizon {
            timesteps: resolved.horizon.timesteps,
            start: resolved.horizon.start,
            step_hours: resolved.horizon.step_hours,
        },
        meta: solved.meta(),
    };

    emit_progress(&mut progress_cb, id, RunStage::SavingResults, started, "Saving results");
    let phase = Instant::now();
    store.save_run(&manifest, &data)?;
    timing.save_time_s = phase.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(&mut progress_cb, id, RunStage::Completed, started, "Run completed");
    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

/// Detach the values of a solved model from the model.
pub fn extract_run_data(solved: &SolvedModel<'_>) -> AppResult<RunData> {
    let storages = solved
        .all_storage_levels()?
        .into_iter()
        .map(|(label, levels)| StorageRecord { label, levels })
        .collect();
    Ok(RunData {
        flows: solved.all_flows()?,
        storages,
        investments: solved.investments()?,
    })
}

/// Compile a system and write its LP without solving.
pub fn write_lp(project_path: &Path, system_id: &str, out: &Path) -> AppResult<ModelStats> {
    let project = project_service::load_project(project_path)?;
    let system = project_service::get_system(&project, system_id)?;
    let resolved = system_compile::resolve_profiles(system, project_path)?;
    let graph = system_compile::compile_system(&resolved)?;
    let model = Model::compile(&graph, &system_compile::compile_options(&resolved))?;
    model.write_lp(out)?;
    info!(system = system_id, path = %out.display(), "Wrote LP file");
    Ok(model.stats())
}

/// Runs of a system, most recent first.
pub fn list_runs(project_path: &Path, system_id: &str) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs(system_id)?)
}

pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, RunData)> {
    let store = RunStore::for_project(project_path)?;
    let manifest = store.load_manifest(run_id)?;
    let data = store.load_data(run_id)?;
    Ok((manifest, data))
}
