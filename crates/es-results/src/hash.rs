//! Content-based hashing for run IDs.

use es_project::schema::SystemDef;
use es_solver::SolveOptions;
use sha2::{Digest, Sha256};

/// Identifies a run by what determines its result.
///
/// `verbose` is not part of the key. Profiles read from files are only
/// covered when the caller inlines them into `system` first.
pub fn compute_run_id(system: &SystemDef, options: &SolveOptions, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let system_json = serde_json::to_string(system).unwrap_or_default();
    hasher.update(system_json.as_bytes());

    hasher.update(options.solver.as_str().as_bytes());
    if let Some(limit) = options.time_limit_s {
        hasher.update(limit.to_le_bytes());
    }

    hasher.update(solver_version.as_bytes());

    format!("{:x}", hasher.finalize())
}
