//! Property-based tests using proptest
//!
//! These tests verify the documented guarantees of the addressing and naming
//! engines - length bounds, character legality, purity, and uniqueness -
//! using randomized tree paths and constraint sets.

use cloudtree::naming::{
    resource_name, Address, CaseConvention, NamingConstraints, ADDRESS_LEN, ADDRESS_TAG,
    HASH_SUFFIX_LEN, TRANSPARENT_ID,
};
use proptest::prelude::*;

/// Generate a single path segment (never the reserved wrapper id)
fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,18}".prop_filter("reserved wrapper id", |s| s != TRANSPARENT_ID)
}

/// Generate a path as an ordered list of segments
fn arb_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_segment(), 1..6)
}

fn refs(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

fn lowercase_constraints(max_len: usize) -> NamingConstraints {
    NamingConstraints::new(max_len, "[^a-z0-9-]", CaseConvention::Lowercase, true)
        .expect("pattern compiles")
}

proptest! {
    /// Addresses always have the fixed 42-character shape
    #[test]
    fn address_shape_is_fixed(path in arb_path()) {
        let addr = Address::of_segments(&refs(&path));
        prop_assert_eq!(addr.as_str().len(), ADDRESS_LEN);
        prop_assert!(addr.as_str().starts_with(ADDRESS_TAG));
        prop_assert!(addr.as_str()[ADDRESS_TAG.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Computing an address twice for the same path yields the same result
    #[test]
    fn address_is_idempotent(path in arb_path()) {
        let segments = refs(&path);
        prop_assert_eq!(Address::of_segments(&segments), Address::of_segments(&segments));
    }

    /// Inserting a transparent wrapper anywhere in the path changes nothing
    #[test]
    fn address_ignores_transparent_wrappers(path in arb_path(), position in 0usize..6) {
        let plain = Address::of_segments(&refs(&path));

        let mut wrapped: Vec<&str> = refs(&path);
        wrapped.insert(position.min(wrapped.len()), TRANSPARENT_ID);
        prop_assert_eq!(plain, Address::of_segments(&wrapped));
    }

    /// Distinct paths yield distinct addresses
    #[test]
    fn distinct_paths_distinct_addresses(a in arb_path(), b in arb_path()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            Address::of_segments(&refs(&a)),
            Address::of_segments(&refs(&b))
        );
    }
}

/// Tests for generated name legality
mod name_legality {
    use super::*;

    proptest! {
        /// Generated names never exceed the configured length cap
        #[test]
        fn never_exceeds_max_len(path in arb_path(), max_len in 1usize..64) {
            let constraints = lowercase_constraints(max_len);
            let addr = Address::of_segments(&refs(&path));
            let name = resource_name(&refs(&path), &addr, &constraints);
            prop_assert!(name.chars().count() <= max_len);
        }

        /// Generated names never contain a disallowed character
        #[test]
        fn never_contains_disallowed(path in arb_path(), max_len in 1usize..64) {
            let constraints = lowercase_constraints(max_len);
            let addr = Address::of_segments(&refs(&path));
            let name = resource_name(&refs(&path), &addr, &constraints);
            prop_assert!(!constraints.disallowed.is_match(&name), "illegal name: {}", name);
        }

        /// The hash suffix survives truncation untouched
        #[test]
        fn suffix_survives_truncation(path in arb_path(), max_len in 9usize..64) {
            let constraints = lowercase_constraints(max_len);
            let addr = Address::of_segments(&refs(&path));
            let name = resource_name(&refs(&path), &addr, &constraints);
            prop_assert!(name.ends_with(addr.suffix(HASH_SUFFIX_LEN)));
        }

        /// Generation is a pure function of its inputs
        #[test]
        fn generation_is_pure(path in arb_path(), max_len in 1usize..64) {
            let constraints = lowercase_constraints(max_len);
            let addr = Address::of_segments(&refs(&path));
            let once = resource_name(&refs(&path), &addr, &constraints);
            let twice = resource_name(&refs(&path), &addr, &constraints);
            prop_assert_eq!(once, twice);
        }
    }
}

/// Tests for cross-node uniqueness
mod name_uniqueness {
    use super::*;

    proptest! {
        /// With the hash suffix included, distinct paths get distinct names
        /// as long as the budget fits the full suffix
        #[test]
        fn distinct_paths_distinct_names(a in arb_path(), b in arb_path(), max_len in 9usize..64) {
            prop_assume!(a != b);
            let constraints = lowercase_constraints(max_len);

            let addr_a = Address::of_segments(&refs(&a));
            let addr_b = Address::of_segments(&refs(&b));
            let name_a = resource_name(&refs(&a), &addr_a, &constraints);
            let name_b = resource_name(&refs(&b), &addr_b, &constraints);
            prop_assert_ne!(name_a, name_b);
        }

        /// Opting out of the hash gives plain sanitized names, where
        /// uniqueness is the caller's problem
        #[test]
        fn opt_out_drops_suffix(path in arb_path()) {
            let constraints = NamingConstraints::new(
                64,
                "[^a-z0-9-]",
                CaseConvention::Lowercase,
                false,
            ).unwrap();
            let addr = Address::of_segments(&refs(&path));
            let name = resource_name(&refs(&path), &addr, &constraints);
            prop_assert!(!name.contains(addr.suffix(HASH_SUFFIX_LEN)));
        }
    }
}
