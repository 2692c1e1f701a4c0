//! Target dispatch
//!
//! Resolves the active target to its factory - the single point where an
//! abstract resource request turns into a per-provider implementation.

use super::aws::AwsFactory;
use super::gcp::GcpFactory;
use super::{Target, TargetFactory};

static AWS: AwsFactory = AwsFactory;
static GCP: GcpFactory = GcpFactory;

/// Factory for the given target.
pub fn factory_for(target: Target) -> &'static dyn TargetFactory {
    tracing::debug!("factory_for: target={}", target);
    match target {
        Target::Aws => &AWS,
        Target::Gcp => &GCP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_matches_target() {
        assert_eq!(factory_for(Target::Aws).target(), Target::Aws);
        assert_eq!(factory_for(Target::Gcp).target(), Target::Gcp);
    }
}
