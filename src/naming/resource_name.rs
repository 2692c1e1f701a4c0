//! Physical resource names
//!
//! Providers constrain physical names in incompatible ways (length caps,
//! allowed alphabets, case rules), so a physical name is derived from the
//! logical path under a per-target constraint set. The address suffix is the
//! collision breaker: two distinct nodes of one tree can sanitize to the same
//! human-readable prefix, but their addresses never agree.

use super::address::Address;
use regex::Regex;
use serde::Deserialize;

/// Characters of the node address reserved as the name suffix.
pub const HASH_SUFFIX_LEN: usize = 8;

/// Case rule a provider enforces on physical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseConvention {
    Lowercase,
    Uppercase,
    None,
}

/// One provider's constraints for one resource kind.
#[derive(Debug, Clone)]
pub struct NamingConstraints {
    /// Hard upper bound on the generated name length.
    pub max_len: usize,
    /// Pattern matching every character the provider rejects.
    pub disallowed: Regex,
    /// Case rule applied to the assembled name.
    pub case: CaseConvention,
    /// Reserve an address-derived suffix to guarantee uniqueness. Opting out
    /// makes uniqueness the caller's responsibility.
    pub include_hash: bool,
}

impl NamingConstraints {
    /// Build a constraint set, compiling the disallowed-character pattern.
    pub fn new(
        max_len: usize,
        disallowed: &str,
        case: CaseConvention,
        include_hash: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            max_len,
            disallowed: Regex::new(disallowed)?,
            case,
            include_hash,
        })
    }
}

/// Derive a provider-legal name from path segments and the node address.
///
/// The case rule is applied per segment before stripping, so a lowercase-only
/// alphabet folds `MyFunction` to `myfunction` instead of stripping its
/// uppercase letters. When the assembled name exceeds `max_len`, characters
/// are dropped from the earliest (root-most) end of the prefix; the hash
/// suffix is never touched.
pub fn resource_name(segments: &[&str], addr: &Address, constraints: &NamingConstraints) -> String {
    let sanitized: String = segments
        .iter()
        .map(|s| {
            let cased = apply_case(s, constraints.case);
            constraints.disallowed.replace_all(&cased, "").into_owned()
        })
        .collect();

    let name = if constraints.include_hash {
        let suffix = apply_case(addr.suffix(HASH_SUFFIX_LEN), constraints.case);
        if constraints.max_len <= HASH_SUFFIX_LEN {
            // No room for a readable prefix; such a budget also cannot carry
            // the full uniqueness suffix.
            tail(&suffix, constraints.max_len).to_string()
        } else {
            let sep = if constraints.disallowed.is_match("-") { "" } else { "-" };
            let budget = constraints.max_len - HASH_SUFFIX_LEN - sep.len();
            let prefix = tail(&sanitized, budget);
            if prefix.is_empty() {
                suffix
            } else {
                format!("{prefix}{sep}{suffix}")
            }
        }
    } else {
        tail(&sanitized, constraints.max_len).to_string()
    };

    tracing::trace!(
        "resource_name: segments={:?}, max_len={}, name={}",
        segments,
        constraints.max_len,
        name
    );
    name
}

fn apply_case(s: &str, case: CaseConvention) -> String {
    match case {
        CaseConvention::Lowercase => s.to_lowercase(),
        CaseConvention::Uppercase => s.to_uppercase(),
        CaseConvention::None => s.to_string(),
    }
}

/// Trailing `keep` characters of `s`, char-aware.
fn tail(s: &str, keep: usize) -> &str {
    let total = s.chars().count();
    if total <= keep {
        return s;
    }
    match s.char_indices().nth(total - keep) {
        Some((byte, _)) => &s[byte..],
        None => "",
    }
}
