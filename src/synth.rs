//! Synthesis session
//!
//! A [`Session`] is the explicit context threaded through one synthesis run:
//! the construct tree, the active target, the connections registry, and the
//! leaf provider resources recorded by target implementations. Synthesis is
//! single-threaded and synchronous - the tree is built, locked, validated,
//! and the artifacts are written out in one pass.

use crate::connections::Connections;
use crate::error::Result;
use crate::naming::address_of;
use crate::target::{
    factory_for, BucketProps, BucketResource, FunctionProps, FunctionResource, ScheduleProps,
    ScheduleResource, Target,
};
use crate::tree::{NodeId, Tree};
use anyhow::Context;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One opaque leaf provider resource recorded during synthesis.
#[derive(Debug, Clone)]
pub struct LeafResource {
    /// Provider resource kind, e.g. `aws_lambda_function`.
    pub kind: String,
    /// Logical node this leaf realizes.
    pub node: NodeId,
    /// Provider-specific properties, opaque to this crate.
    pub props: Value,
}

/// Result of a synthesis run. A non-empty `diagnostics` list is not an error
/// here - the caller decides whether to treat it as fatal.
#[derive(Debug)]
pub struct SynthReport {
    pub diagnostics: Vec<String>,
    pub connections_path: PathBuf,
    pub resources_path: PathBuf,
}

/// Context for one synthesis run. Exactly one target is active per session.
pub struct Session {
    tree: Tree,
    target: Target,
    connections: Connections,
    leaves: Vec<LeafResource>,
}

impl Session {
    pub fn new(target: Target, root_id: &str) -> Self {
        Self {
            tree: Tree::new(root_id),
            target,
            connections: Connections::new(),
            leaves: Vec::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Record a named directed relation for introspection tooling.
    pub fn connect(&mut self, source: NodeId, target: NodeId, name: &str) {
        self.connections.add(source, target, name);
    }

    /// Record a leaf provider resource under `node`.
    pub fn add_leaf(&mut self, node: NodeId, kind: &str, props: Value) {
        tracing::trace!("add_leaf: kind={}, path={}", kind, self.tree.path(node));
        self.leaves.push(LeafResource {
            kind: kind.to_string(),
            node,
            props,
        });
    }

    /// Leaf resources in recording order.
    pub fn leaves(&self) -> &[LeafResource] {
        &self.leaves
    }

    /// Create a function through the active target's factory.
    pub fn new_function(
        &mut self,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Box<dyn FunctionResource>> {
        factory_for(self.target).function(self, scope, id, props)
    }

    /// Create a schedule through the active target's factory.
    pub fn new_schedule(
        &mut self,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Box<dyn ScheduleResource>> {
        factory_for(self.target).schedule(self, scope, id, props)
    }

    /// Create a bucket through the active target's factory.
    pub fn new_bucket(
        &mut self,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Box<dyn BucketResource>> {
        factory_for(self.target).bucket(self, scope, id, props)
    }

    /// Leaf resources ordered so that a node's dependencies synthesize before
    /// it. Dependency edges are ordering-only; within one node, recording
    /// order is preserved, and nodes without edges keep their relative order.
    pub fn ordered_leaves(&self) -> Vec<&LeafResource> {
        let mut node_order: Vec<NodeId> = Vec::new();
        let mut by_node: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (i, leaf) in self.leaves.iter().enumerate() {
            by_node
                .entry(leaf.node)
                .or_insert_with(|| {
                    node_order.push(leaf.node);
                    Vec::new()
                })
                .push(i);
        }

        fn visit(
            node: NodeId,
            tree: &Tree,
            by_node: &HashMap<NodeId, Vec<usize>>,
            done: &mut HashSet<NodeId>,
            visiting: &mut HashSet<NodeId>,
            out: &mut Vec<usize>,
        ) {
            if done.contains(&node) || !visiting.insert(node) {
                return;
            }
            for &dep in tree.node(node).dependencies() {
                visit(dep, tree, by_node, done, visiting, out);
            }
            visiting.remove(&node);
            done.insert(node);
            if let Some(indices) = by_node.get(&node) {
                out.extend(indices.iter().copied());
            }
        }

        let mut out = Vec::with_capacity(self.leaves.len());
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        for &node in &node_order {
            visit(node, &self.tree, &by_node, &mut done, &mut visiting, &mut out);
        }
        out.iter().map(|&i| &self.leaves[i]).collect()
    }

    /// Finish the run: lock the tree, collect validation diagnostics, and
    /// write the artifacts under `out_dir`.
    ///
    /// Diagnostics are aggregated over the whole tree and reported once in
    /// the returned [`SynthReport`]; they never abort the run.
    pub fn synth(&mut self, out_dir: &Path) -> anyhow::Result<SynthReport> {
        let root = self.tree.root();
        tracing::info!(
            "synth: target={}, root={}, leaves={}",
            self.target,
            self.tree.path(root),
            self.leaves.len()
        );

        self.tree.lock(root);
        let diagnostics = self.tree.validate(root);
        if !diagnostics.is_empty() {
            tracing::warn!("synth: {} validation finding(s)", diagnostics.len());
        }

        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let connections_path = out_dir.join("connections.json");
        let connections_doc = serde_json::json!({
            "version": crate::VERSION,
            "synthesized_at": chrono::Utc::now().to_rfc3339(),
            "connections": self.connections.to_records(&self.tree),
        });
        std::fs::write(
            &connections_path,
            serde_json::to_string_pretty(&connections_doc)?,
        )
        .with_context(|| format!("Failed to write {}", connections_path.display()))?;

        let records: Vec<Value> = self
            .ordered_leaves()
            .into_iter()
            .map(|leaf| {
                serde_json::json!({
                    "kind": leaf.kind,
                    "path": self.tree.path(leaf.node),
                    "address": address_of(&self.tree, leaf.node),
                    "props": leaf.props,
                })
            })
            .collect();
        let resources_path = out_dir.join("resources.json");
        let resources_doc = serde_json::json!({
            "target": self.target,
            "resources": records,
        });
        std::fs::write(
            &resources_path,
            serde_json::to_string_pretty(&resources_doc)?,
        )
        .with_context(|| format!("Failed to write {}", resources_path.display()))?;

        tracing::info!(
            "synth: wrote {} and {}",
            connections_path.display(),
            resources_path.display()
        );

        Ok(SynthReport {
            diagnostics,
            connections_path,
            resources_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordered_leaves_respect_dependencies() {
        let mut session = Session::new(Target::Aws, "App");
        let root = session.tree().root();
        let a = session.tree_mut().add_child(root, "A").unwrap();
        let b = session.tree_mut().add_child(root, "B").unwrap();

        session.add_leaf(a, "kind_a", json!({}));
        session.add_leaf(b, "kind_b", json!({}));
        // Recorded a-first, but a depends on b.
        session.tree_mut().add_dependency(a, b);

        let kinds: Vec<&str> = session
            .ordered_leaves()
            .iter()
            .map(|l| l.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["kind_b", "kind_a"]);
    }

    #[test]
    fn test_ordered_leaves_keep_recording_order_without_edges() {
        let mut session = Session::new(Target::Aws, "App");
        let root = session.tree().root();
        let a = session.tree_mut().add_child(root, "A").unwrap();

        session.add_leaf(a, "first", json!({}));
        session.add_leaf(a, "second", json!({}));

        let kinds: Vec<&str> = session
            .ordered_leaves()
            .iter()
            .map(|l| l.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["first", "second"]);
    }

    #[test]
    fn test_ordered_leaves_tolerate_cycles() {
        let mut session = Session::new(Target::Aws, "App");
        let root = session.tree().root();
        let a = session.tree_mut().add_child(root, "A").unwrap();
        let b = session.tree_mut().add_child(root, "B").unwrap();

        session.add_leaf(a, "kind_a", json!({}));
        session.add_leaf(b, "kind_b", json!({}));
        session.tree_mut().add_dependency(a, b);
        session.tree_mut().add_dependency(b, a);

        // Connections are observational and dependencies ordering-only; a
        // cycle must not hang or drop leaves.
        assert_eq!(session.ordered_leaves().len(), 2);
    }

    #[test]
    fn test_factory_dispatch_through_session() {
        let mut session = Session::new(Target::Gcp, "App");
        let root = session.tree().root();
        let f = session
            .new_function(
                root,
                "Fn",
                FunctionProps::new(crate::handler::Handler::bare("h.w", "H")),
            )
            .unwrap();

        assert!(crate::target::as_gcp_function(f.as_ref()).is_some());
        assert!(crate::target::as_aws_function(f.as_ref()).is_none());
    }
}
