//! es-core: stable foundation for esflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for buses, nodes, flows and LP rows/columns)
//! - error (shared error types)
//! - timing (opt-in phase timers)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;

pub use error::{EsError, EsResult};
pub use ids::*;
pub use numeric::*;
