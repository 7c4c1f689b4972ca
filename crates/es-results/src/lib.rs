//! es-results: run cache, dump/restore of solved values and CSV export.

pub mod export;
pub mod hash;
pub mod store;
pub mod types;

pub use export::{export_node_csv, write_node_csv};
pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("No flows attached to '{label}' in run {run_id}")]
    UnknownLabel { run_id: String, label: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
