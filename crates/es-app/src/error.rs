//! Error types for the es-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for frontends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("System not found: {0}")]
    SystemNotFound(String),

    #[error("Profile data error in {path}: {message}")]
    Profile { path: PathBuf, message: String },

    #[error("Graph construction failed: {0}")]
    Graph(String),

    #[error("Model compilation failed: {0}")]
    Compile(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for es-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<es_project::ProjectError> for AppError {
    fn from(err: es_project::ProjectError) -> Self {
        match err {
            es_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<es_graph::GraphError> for AppError {
    fn from(err: es_graph::GraphError) -> Self {
        AppError::Graph(err.to_string())
    }
}

impl From<es_model::ModelError> for AppError {
    fn from(err: es_model::ModelError) -> Self {
        match err {
            es_model::ModelError::Graph(e) => AppError::Graph(e.to_string()),
            es_model::ModelError::Lp(e) => AppError::Solver(e.to_string()),
            other => AppError::Compile(other.to_string()),
        }
    }
}

impl From<es_solver::LpError> for AppError {
    fn from(err: es_solver::LpError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<es_results::ResultsError> for AppError {
    fn from(err: es_results::ResultsError) -> Self {
        match err {
            es_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
