//! Label lookup.
//!
//! Buses and nodes share one label namespace. The index maps labels to
//! arena ids and keeps registration order for deterministic iteration.

use std::collections::HashMap;

use es_core::{BusId, NodeId};

use crate::error::{GraphError, GraphResult};

/// Arena entry a label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Bus(BusId),
    Node(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    by_label: HashMap<String, EntityRef>,
    /// Registration order.
    order: Vec<String>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label, failing on collisions.
    pub fn insert(&mut self, label: &str, entity: EntityRef) -> GraphResult<()> {
        if self.by_label.contains_key(label) {
            return Err(GraphError::DuplicateLabel {
                label: label.to_string(),
            });
        }
        self.by_label.insert(label.to_string(), entity);
        self.order.push(label.to_string());
        Ok(())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    pub fn get(&self, label: &str) -> Option<EntityRef> {
        self.by_label.get(label).copied()
    }

    /// Look up a label, failing with `UnknownLabel`.
    pub fn resolve(&self, label: &str) -> GraphResult<EntityRef> {
        self.get(label).ok_or_else(|| GraphError::UnknownLabel {
            label: label.to_string(),
        })
    }

    pub fn bus(&self, label: &str) -> Option<BusId> {
        match self.get(label)? {
            EntityRef::Bus(id) => Some(id),
            EntityRef::Node(_) => None,
        }
    }

    pub fn node(&self, label: &str) -> Option<NodeId> {
        match self.get(label)? {
            EntityRef::Node(id) => Some(id),
            EntityRef::Bus(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
