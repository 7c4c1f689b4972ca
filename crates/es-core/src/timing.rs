//! Opt-in phase timing summaries.
//!
//! Summaries are silent unless enabled programmatically or through the
//! `ES_TIMING` environment variable.

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("ES_TIMING").is_ok()
}

/// Per-run phase durations.
#[derive(Debug, Clone, Default)]
pub struct PerfStats {
    pub resolve_time_s: f64,
    pub compile_time_s: f64,
    pub lp_write_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub load_time_s: f64,
}

impl PerfStats {
    /// Print a formatted summary of the statistics.
    pub fn print_summary(&self) {
        if !is_enabled() {
            return;
        }
        print!("{}", self.summary());
    }

    /// Phase lines with their share of the total. Zero phases are skipped.
    pub fn summary(&self) -> String {
        let total = self.total_s().max(1.0e-12);
        let mut out = String::from("\n=== Performance Summary ===\n");
        for (label, secs) in [
            ("Profiles", self.resolve_time_s),
            ("Compile", self.compile_time_s),
            ("LP write", self.lp_write_time_s),
            ("Solve", self.solve_time_s),
            ("Run save", self.save_time_s),
            ("Cache load", self.load_time_s),
        ] {
            if secs > 0.0 {
                out.push_str(&format!(
                    "{:<12}{:>9.3}s ({:.1}%)\n",
                    format!("{label}:"),
                    secs,
                    100.0 * secs / total
                ));
            }
        }
        out.push_str(&format!("{:<12}{:>9.3}s\n", "Total:", self.total_s()));
        out.push_str("==========================\n");
        out
    }

    pub fn total_s(&self) -> f64 {
        self.resolve_time_s
            + self.compile_time_s
            + self.lp_write_time_s
            + self.solve_time_s
            + self.save_time_s
            + self.load_time_s
    }
}
