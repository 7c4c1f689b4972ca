//! es-graph: graph/model layer for esflow.
//!
//! Provides:
//! - Core energy-system records (Bus, Node, Flow) stored in arenas
//! - Incremental graph builder with label and reference checks
//! - Time horizon and per-flow profiles
//! - Label lookup for result extraction
//!
//! # Example
//!
//! ```
//! use es_graph::{FlowSpec, GraphBuilder, Profile, TimeHorizon};
//!
//! let mut builder = GraphBuilder::new();
//! let el = builder.add_bus("electricity").unwrap();
//! builder
//!     .add_source("grid", vec![(el, FlowSpec::new().nominal_value(3.0))])
//!     .unwrap();
//! builder
//!     .add_sink(
//!         "demand",
//!         vec![(el, FlowSpec::new().nominal_value(1.0).fixed(Profile::Constant(2.11)))],
//!     )
//!     .unwrap();
//! let graph = builder.build(TimeHorizon::uniform(1)).unwrap();
//!
//! assert_eq!(graph.buses().len(), 1);
//! assert_eq!(graph.flows().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod flow;
pub mod graph;
pub mod horizon;
pub mod indexing;
pub(crate) mod validate;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use flow::{Flow, FlowDirection, FlowSpec, Investment, Profile};
pub use graph::{Bus, BusFlows, Graph, Node, NodeKind, StorageParams};
pub use horizon::TimeHorizon;
pub use indexing::{EntityRef, LabelIndex};
