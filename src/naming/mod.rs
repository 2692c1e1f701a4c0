//! Naming engine
//!
//! Everything that turns a logical tree path into a stable identifier.
//!
//! # Architecture
//!
//! - [`address`] - 42-character addresses, the durable identity of a node
//! - [`resource_name`] - provider-legal physical names derived from a path
//!   plus per-target constraints, with the address as collision breaker
//!
//! Both are pure functions of the path: recomputing after a structural change
//! yields a different result only if non-wrapper segments changed.

mod address;
mod resource_name;

pub use address::{address_of, Address, ADDRESS_LEN, ADDRESS_TAG, TRANSPARENT_ID};
pub use resource_name::{resource_name, CaseConvention, NamingConstraints, HASH_SUFFIX_LEN};
