//! Construct tree
//!
//! The scope/parent/child hierarchy every other layer hangs off of.
//!
//! # Architecture
//!
//! - [`node`] - the arena ([`Tree`]) owning every node record, plus structural
//!   mutation, inherited context, dependency edges, metadata, and locking
//! - [`traverse`] - PREORDER/POSTORDER walks and aggregated validation
//!
//! A [`NodeId`] is the identity of a tree element; the arena is the explicit
//! side-table mapping that identity to its companion record. Handing the same
//! `NodeId` to [`Tree::node`] always yields the identical record.

mod node;
mod traverse;

pub use node::{MetadataEntry, Node, NodeId, Tree, Validator};
pub use traverse::TraversalOrder;
