//! Tree arena and node records
//!
//! A [`Tree`] owns one record per tree element and hands out copyable
//! [`NodeId`] handles. All structural mutation goes through the tree so the
//! locking and uniqueness invariants have a single enforcement point.

use crate::error::{Result, SynthError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Identity of a tree element inside its owning [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One metadata entry attached to a node. Append-only, ordered.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataEntry {
    pub kind: String,
    pub data: Value,
    pub source_location: Option<String>,
}

/// A zero-argument validator registered on a node. Returns findings as
/// messages; an empty list means the node is healthy.
pub type Validator = Box<dyn Fn() -> Vec<String>>;

/// Companion record for one tree element.
pub struct Node {
    id: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    child_index: HashMap<String, NodeId>,
    context: HashMap<String, Value>,
    dependencies: Vec<NodeId>,
    metadata: Vec<MetadataEntry>,
    validations: Vec<Validator>,
    locked: bool,
}

impl Node {
    fn new(id: &str, parent: Option<NodeId>) -> Self {
        debug_assert!(!id.is_empty(), "node id must not be empty");
        debug_assert!(!id.contains('/'), "node id must not contain '/'");
        Self {
            id: id.to_string(),
            parent,
            children: Vec::new(),
            child_index: HashMap::new(),
            context: HashMap::new(),
            dependencies: Vec::new(),
            metadata: Vec::new(),
            validations: Vec::new(),
            locked: false,
        }
    }

    /// Scope-unique id of this node.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning parent, `None` at the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Ordering-only dependency edges registered on this node.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Metadata entries in append order.
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    pub(super) fn validations(&self) -> &[Validator] {
        &self.validations
    }
}

/// The arena owning every node of one construct tree.
///
/// Created with its root record in place; all further elements are created
/// with [`Tree::add_child`]. Records live exactly as long as the tree.
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree with a single root node.
    pub fn new(root_id: &str) -> Self {
        Self {
            nodes: vec![Node::new(root_id, None)],
        }
    }

    /// The root node handle.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Companion record for `node`. Every call with the same id observes the
    /// identical record.
    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node.index()]
    }

    fn node_mut(&mut self, node: NodeId) -> &mut Node {
        &mut self.nodes[node.index()]
    }

    /// Create a child of `parent` with the given scope-unique id.
    ///
    /// Fails with [`SynthError::LockedTreeMutation`] once the parent or any of
    /// its ancestors is locked, and with [`SynthError::DuplicateChildId`] if a
    /// sibling already carries the id.
    pub fn add_child(&mut self, parent: NodeId, id: &str) -> Result<NodeId> {
        if let Some(locked_at) = self.locked_ancestor(parent) {
            return Err(SynthError::LockedTreeMutation {
                path: self.path(parent),
                locked_at: self.path(locked_at),
            });
        }
        if self.node(parent).child_index.contains_key(id) {
            return Err(SynthError::DuplicateChildId {
                path: self.path(parent),
                id: id.to_string(),
            });
        }

        let child = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, Some(parent)));
        let record = self.node_mut(parent);
        record.children.push(child);
        record.child_index.insert(id.to_string(), child);
        tracing::trace!("add_child: parent={}, id={}", self.path(parent), id);
        Ok(child)
    }

    /// Direct child of `parent` by id.
    pub fn find_child(&self, parent: NodeId, id: &str) -> Result<NodeId> {
        self.try_find_child(parent, id)
            .ok_or_else(|| SynthError::ChildNotFound {
                path: self.path(parent),
                id: id.to_string(),
            })
    }

    /// Direct child of `parent` by id, `None` when absent. Never fails.
    pub fn try_find_child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.node(parent).child_index.get(id).copied()
    }

    /// Ordered ids from the root down to `node`.
    pub fn segments(&self, node: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let record = self.node(id);
            segments.push(record.id.as_str());
            current = record.parent;
        }
        segments.reverse();
        segments
    }

    /// Slash-joined path from the root down to `node`. Unique within the tree.
    pub fn path(&self, node: NodeId) -> String {
        self.segments(node).join("/")
    }

    /// Write a context value at this node, overwriting any previous value for
    /// the key.
    ///
    /// Precondition (documented, not enforced): call this before creating
    /// descendants that read the key during their own construction - context
    /// is resolved by walking ancestors at read time, so a late write is
    /// invisible to reads that already happened.
    pub fn set_context(&mut self, node: NodeId, key: &str, value: Value) {
        self.node_mut(node).context.insert(key.to_string(), value);
    }

    /// Resolve a context key from `node` up through its ancestors; the first
    /// match wins.
    pub fn get_context(&self, node: NodeId, key: &str) -> Result<&Value> {
        self.try_get_context(node, key)
            .ok_or_else(|| SynthError::ContextKeyNotFound {
                path: self.path(node),
                key: key.to_string(),
            })
    }

    /// Same ancestor walk as [`Tree::get_context`], returning `None` when the
    /// key is absent all the way to the root.
    pub fn try_get_context(&self, node: NodeId, key: &str) -> Option<&Value> {
        let mut current = Some(node);
        while let Some(id) = current {
            let record = self.node(id);
            if let Some(value) = record.context.get(key) {
                return Some(value);
            }
            current = record.parent;
        }
        None
    }

    /// Register an ordering-only edge: `node` synthesizes after `on`.
    ///
    /// Set semantics - re-adding an existing edge is a no-op. No data flow is
    /// implied; downstream synthesis consults these edges purely to order
    /// generated output.
    pub fn add_dependency(&mut self, node: NodeId, on: NodeId) {
        let record = self.node_mut(node);
        if !record.dependencies.contains(&on) {
            record.dependencies.push(on);
        }
    }

    /// Append a metadata entry to `node`.
    pub fn add_metadata(
        &mut self,
        node: NodeId,
        kind: &str,
        data: Value,
        source_location: Option<String>,
    ) {
        self.node_mut(node).metadata.push(MetadataEntry {
            kind: kind.to_string(),
            data,
            source_location,
        });
    }

    /// Register a validator on `node`. Rejected once the subtree is locked.
    pub fn add_validation(&mut self, node: NodeId, validator: Validator) -> Result<()> {
        if let Some(locked_at) = self.locked_ancestor(node) {
            return Err(SynthError::LockedTreeMutation {
                path: self.path(node),
                locked_at: self.path(locked_at),
            });
        }
        self.node_mut(node).validations.push(validator);
        Ok(())
    }

    /// Lock `node`. The restriction covers the whole subtree: any later
    /// attempt to add children or validators at or below it fails with
    /// [`SynthError::LockedTreeMutation`].
    pub fn lock(&mut self, node: NodeId) {
        tracing::debug!("lock: path={}", self.path(node));
        self.node_mut(node).locked = true;
    }

    /// Whether `node` is locked, directly or through an ancestor.
    pub fn is_locked(&self, node: NodeId) -> bool {
        self.locked_ancestor(node).is_some()
    }

    /// Nearest locked node walking from `node` up to the root.
    fn locked_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            let record = self.node(id);
            if record.locked {
                return Some(id);
            }
            current = record.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_and_find_child() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        assert_eq!(tree.find_child(tree.root(), "A").unwrap(), a);
        assert_eq!(tree.path(a), "Root/A");
        assert_eq!(tree.segments(a), vec!["Root", "A"]);
    }

    #[test]
    fn test_duplicate_child_id_rejected() {
        let mut tree = Tree::new("Root");
        tree.add_child(tree.root(), "A").unwrap();
        let err = tree.add_child(tree.root(), "A").unwrap_err();
        assert!(matches!(err, SynthError::DuplicateChildId { .. }));
    }

    #[test]
    fn test_find_child_missing() {
        let tree = Tree::new("Root");
        let err = tree.find_child(tree.root(), "Nope").unwrap_err();
        assert!(matches!(err, SynthError::ChildNotFound { .. }));
        assert!(tree.try_find_child(tree.root(), "Nope").is_none());
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = Tree::new("Root");
        let b = tree.add_child(tree.root(), "B").unwrap();
        let a = tree.add_child(tree.root(), "A").unwrap();
        let c = tree.add_child(tree.root(), "C").unwrap();
        assert_eq!(tree.node(tree.root()).children(), &[b, a, c]);
    }

    #[test]
    fn test_context_walks_ancestors() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        let b = tree.add_child(a, "B").unwrap();
        tree.set_context(tree.root(), "region", json!("us-central1"));
        tree.set_context(a, "region", json!("eu-west1"));

        // Nearest write wins; unrelated keys resolve up to the root.
        assert_eq!(tree.get_context(b, "region").unwrap(), &json!("eu-west1"));
        tree.set_context(tree.root(), "env", json!("prod"));
        assert_eq!(tree.get_context(b, "env").unwrap(), &json!("prod"));

        let err = tree.get_context(b, "missing").unwrap_err();
        assert!(matches!(err, SynthError::ContextKeyNotFound { .. }));
        assert!(tree.try_get_context(b, "missing").is_none());
    }

    #[test]
    fn test_context_overwrites_on_conflict() {
        let mut tree = Tree::new("Root");
        tree.set_context(tree.root(), "k", json!(1));
        tree.set_context(tree.root(), "k", json!(2));
        assert_eq!(tree.get_context(tree.root(), "k").unwrap(), &json!(2));
    }

    #[test]
    fn test_dependency_set_semantics() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        let b = tree.add_child(tree.root(), "B").unwrap();
        tree.add_dependency(a, b);
        tree.add_dependency(a, b);
        assert_eq!(tree.node(a).dependencies(), &[b]);
    }

    #[test]
    fn test_metadata_appends_in_order() {
        let mut tree = Tree::new("Root");
        tree.add_metadata(tree.root(), "info", json!("first"), None);
        tree.add_metadata(
            tree.root(),
            "warning",
            json!("second"),
            Some("app.w:12".to_string()),
        );
        let entries = tree.node(tree.root()).metadata();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "info");
        assert_eq!(entries[1].source_location.as_deref(), Some("app.w:12"));
    }

    #[test]
    fn test_lock_blocks_mutation_below() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        tree.add_child(a, "Before").unwrap();

        tree.lock(tree.root());
        assert!(tree.is_locked(a));

        let err = tree.add_child(a, "After").unwrap_err();
        assert!(matches!(err, SynthError::LockedTreeMutation { .. }));

        let err = tree.add_validation(a, Box::new(Vec::new)).unwrap_err();
        assert!(matches!(err, SynthError::LockedTreeMutation { .. }));
    }

    #[test]
    fn test_lock_error_names_locked_node() {
        let mut tree = Tree::new("Root");
        let a = tree.add_child(tree.root(), "A").unwrap();
        let b = tree.add_child(a, "B").unwrap();
        tree.lock(a);
        match tree.add_child(b, "C").unwrap_err() {
            SynthError::LockedTreeMutation { path, locked_at } => {
                assert_eq!(path, "Root/A/B");
                assert_eq!(locked_at, "Root/A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
