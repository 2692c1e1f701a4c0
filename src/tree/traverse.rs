//! Traversal and validation
//!
//! Walks are recomputed fresh on every call - nothing here caches, so a walk
//! taken after a structural change always reflects the current tree.

use super::node::{NodeId, Tree};

/// Order in which [`Tree::find_all`] yields a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Node before its descendants, children in insertion order, recursively.
    PreOrder,
    /// Descendants before the node.
    PostOrder,
}

impl Tree {
    /// The node and all of its descendants as an ordered sequence.
    pub fn find_all(&self, node: NodeId, order: TraversalOrder) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect(node, order, &mut out);
        out
    }

    fn collect(&self, node: NodeId, order: TraversalOrder, out: &mut Vec<NodeId>) {
        if order == TraversalOrder::PreOrder {
            out.push(node);
        }
        for &child in self.node(node).children() {
            self.collect(child, order, out);
        }
        if order == TraversalOrder::PostOrder {
            out.push(node);
        }
    }

    /// Run every validator registered in the subtree rooted at `node` and
    /// concatenate their findings.
    ///
    /// Never fails: validation problems are reported as messages, and an
    /// empty list means the subtree is healthy. Whether a non-empty list is
    /// fatal is the caller's decision.
    pub fn validate(&self, node: NodeId) -> Vec<String> {
        let mut findings = Vec::new();
        for id in self.find_all(node, TraversalOrder::PreOrder) {
            for validator in self.node(id).validations() {
                findings.extend(validator());
            }
        }
        if !findings.is_empty() {
            tracing::debug!(
                "validate: path={}, findings={}",
                self.path(node),
                findings.len()
            );
        }
        findings
    }
}
