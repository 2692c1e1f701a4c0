//! Target definition registry
//!
//! Loads per-target constraint definitions from embedded JSON files and
//! provides typed lookups for the rest of the crate. Definitions carry the
//! numeric limits a target enforces at construction time and the naming
//! constraint sets its physical names must satisfy.

use super::Target;
use crate::error::{Result, SynthError};
use crate::naming::{CaseConvention, NamingConstraints};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded target definition files (compiled into the binary)
const DEFINITION_FILES: &[&str] = &[
    include_str!("../definitions/aws.json"),
    include_str!("../definitions/gcp.json"),
];

/// Inclusive numeric bound from JSON
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Range {
    pub min: u64,
    pub max: u64,
}

impl Range {
    pub fn contains(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Function limits from JSON
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FunctionLimits {
    pub memory_mb: Range,
    pub timeout_secs: Range,
}

/// Schedule limits from JSON
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScheduleLimits {
    pub interval_secs: Range,
}

/// Naming constraint set from JSON (pattern still uncompiled)
#[derive(Debug, Clone, Deserialize)]
struct NamingDef {
    max_len: usize,
    disallowed_pattern: String,
    case: CaseConvention,
    #[serde(default = "default_include_hash")]
    include_hash: bool,
}

fn default_include_hash() -> bool {
    true
}

/// Root structure of definitions/*.json
#[derive(Debug, Clone, Deserialize)]
struct TargetDef {
    target: Target,
    function: FunctionLimits,
    schedule: ScheduleLimits,
    naming: HashMap<String, NamingDef>,
}

/// Compiled definition for one target
#[derive(Debug)]
pub struct TargetSpec {
    pub function: FunctionLimits,
    pub schedule: ScheduleLimits,
    naming: HashMap<String, NamingConstraints>,
}

impl TargetSpec {
    /// Naming constraints for a resource kind ("function", "bucket", ...).
    pub fn naming(&self, kind: &str) -> Option<&NamingConstraints> {
        self.naming.get(kind)
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<HashMap<Target, TargetSpec>> = OnceLock::new();

/// Get the definition registry (loads from embedded JSON on first access)
fn get_registry() -> &'static HashMap<Target, TargetSpec> {
    REGISTRY.get_or_init(|| {
        let mut specs = HashMap::new();

        for content in DEFINITION_FILES {
            let def: TargetDef = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded target definition: {}", e));

            let naming = def
                .naming
                .into_iter()
                .map(|(kind, n)| {
                    let constraints = NamingConstraints::new(
                        n.max_len,
                        &n.disallowed_pattern,
                        n.case,
                        n.include_hash,
                    )
                    .unwrap_or_else(|e| {
                        panic!(
                            "Invalid disallowed pattern for {}/{}: {}",
                            def.target, kind, e
                        )
                    });
                    (kind, constraints)
                })
                .collect();

            specs.insert(
                def.target,
                TargetSpec {
                    function: def.function,
                    schedule: def.schedule,
                    naming,
                },
            );
        }

        specs
    })
}

/// Get the compiled definition for a target
pub fn get_spec(target: Target) -> &'static TargetSpec {
    get_registry()
        .get(&target)
        .unwrap_or_else(|| panic!("No embedded definition for target '{}'", target))
}

/// Check a numeric field against a target limit, fail-fast on violation
pub(crate) fn check_range(
    path: &str,
    field: &str,
    value: u64,
    range: Range,
    unit: &str,
    target: Target,
) -> Result<()> {
    if !range.contains(value) {
        return Err(SynthError::constraint(
            path,
            field,
            value,
            format!("supported range {} {} on {}", range, unit, target),
        ));
    }
    Ok(())
}
