//! Shared application service layer for esflow.
//!
//! Frontends go through this crate for project management, graph
//! compilation, cached runs and queries on stored results.

pub mod batch;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;
pub mod system_compile;

pub use batch::{BatchItem, run_all};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{
    SystemSummary, get_system, list_systems, load_project, save_project, validate_project,
};
pub use query::{
    RunSummary, get_run_summary, investments_of, list_labels, node_series, storage_series,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    extract_run_data, list_runs, load_run, run_system, write_lp,
};
pub use system_compile::{build_graph, compile_system, resolve_profiles};
