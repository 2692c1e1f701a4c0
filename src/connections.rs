//! Connections registry
//!
//! An append-only record of named directed relations between nodes, kept for
//! external visualization tooling. Connections are observational metadata:
//! nothing here orders synthesis, nothing rejects cycles, and nothing is ever
//! removed or deduplicated. Iteration order equals call order.
//!
//! One registry lives on each synthesis [`Session`](crate::synth::Session)
//! and is threaded through the call chain explicitly.

use crate::tree::{NodeId, Tree};
use serde::Serialize;

/// A named directed relation between two nodes. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub name: String,
}

/// Path-resolved form of a connection, as written to the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRecord {
    pub source: String,
    pub target: String,
    pub name: String,
}

/// Append-only registry of connections for one tree.
#[derive(Debug, Default)]
pub struct Connections {
    records: Vec<Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection. Duplicates and cycles are accepted as-is.
    pub fn add(&mut self, source: NodeId, target: NodeId, name: &str) {
        self.records.push(Connection {
            source,
            target,
            name: name.to_string(),
        });
    }

    /// Connections in call order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve node handles to tree paths for serialization.
    pub fn to_records(&self, tree: &Tree) -> Vec<ConnectionRecord> {
        self.records
            .iter()
            .map(|c| ConnectionRecord {
                source: tree.path(c.source),
                target: tree.path(c.target),
                name: c.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_equals_call_order() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        let b = tree.add_child(tree.root(), "B").unwrap();

        let mut connections = Connections::new();
        connections.add(a, b, "invokes");
        connections.add(b, a, "notifies");
        connections.add(a, b, "invokes");

        let names: Vec<&str> = connections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["invokes", "notifies", "invokes"]);
        // Duplicates are kept.
        assert_eq!(connections.len(), 3);
    }

    #[test]
    fn test_records_resolve_paths() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        let b = tree.add_child(a, "B").unwrap();

        let mut connections = Connections::new();
        connections.add(a, b, "owns");

        let records = connections.to_records(&tree);
        assert_eq!(records[0].source, "Root/A");
        assert_eq!(records[0].target, "Root/A/B");
    }
}
