//! Node addresses
//!
//! An address is the durable identity a deployed physical resource keeps
//! across re-synthesis runs: a constant 2-character tag followed by the first
//! 40 lowercase hex characters of a SHA-256 digest over the node's path
//! segments. Segments equal to the reserved transparent-wrapper id are elided
//! before hashing, so inserting or removing such a wrapper in a path does not
//! relabel anything deployed under it. Hash collisions are not handled.

use crate::tree::{NodeId, Tree};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Constant tag every address starts with.
pub const ADDRESS_TAG: &str = "c8";

/// Total address length: tag plus 40 hex characters.
pub const ADDRESS_LEN: usize = 42;

/// Reserved id of transparent wrapper nodes, excluded from hashing.
pub const TRANSPARENT_ID: &str = "Default";

/// A 42-character node address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Compute the address for an ordered list of path segments.
    pub fn of_segments(segments: &[&str]) -> Self {
        let meaningful: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|s| *s != TRANSPARENT_ID)
            .collect();
        // Ids cannot contain '/', so the join is unambiguous.
        let mut hasher = Sha256::new();
        hasher.update(meaningful.join("/").as_bytes());
        let digest = hex::encode(hasher.finalize());
        Address(format!("{}{}", ADDRESS_TAG, &digest[..ADDRESS_LEN - ADDRESS_TAG.len()]))
    }

    /// The full 42-character address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing `n` characters, used for name suffixes and environment keys.
    pub fn suffix(&self, n: usize) -> &str {
        &self.0[self.0.len() - n.min(self.0.len())..]
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of `node`, derived from its current path.
pub fn address_of(tree: &Tree, node: NodeId) -> Address {
    Address::of_segments(&tree.segments(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_shape() {
        let addr = Address::of_segments(&["App", "Queue"]);
        assert_eq!(addr.as_str().len(), ADDRESS_LEN);
        assert!(addr.as_str().starts_with(ADDRESS_TAG));
        assert!(addr.as_str()[2..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_address_is_pure_and_idempotent() {
        let a = Address::of_segments(&["App", "Queue", "Topic"]);
        let b = Address::of_segments(&["App", "Queue", "Topic"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_transparent_wrapper_is_elided() {
        let plain = Address::of_segments(&["App", "Queue", "Topic"]);
        let wrapped = Address::of_segments(&["App", "Queue", "Default", "Topic"]);
        assert_eq!(plain, wrapped);
    }

    #[test]
    fn test_distinct_paths_get_distinct_addresses() {
        let a = Address::of_segments(&["App", "Queue"]);
        let b = Address::of_segments(&["App", "Topic"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_segment_boundaries_matter() {
        let a = Address::of_segments(&["App", "QueueTopic"]);
        let b = Address::of_segments(&["App", "Queue", "Topic"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_suffix() {
        let addr = Address::of_segments(&["App"]);
        assert_eq!(addr.suffix(8).len(), 8);
        assert!(addr.as_str().ends_with(addr.suffix(8)));
    }

    #[test]
    fn test_address_of_tree_node() {
        let mut tree = crate::tree::Tree::new("App");
        let q = tree.add_child(tree.root(), "Queue").unwrap();
        let wrapper = tree.add_child(q, "Default").unwrap();
        let t = tree.add_child(wrapper, "Topic").unwrap();

        assert_eq!(
            address_of(&tree, t),
            Address::of_segments(&["App", "Queue", "Topic"])
        );
    }
}
