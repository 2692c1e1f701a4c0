//! Target resource abstraction
//!
//! One abstract resource model, one concrete realization per deployment
//! target.
//!
//! # Architecture
//!
//! - [`registry`] - per-target limits and naming constraints from embedded
//!   JSON definition files
//! - [`dispatch`] - resolves the active target to its factory
//! - [`aws`] / [`gcp`] - the concrete implementations
//!
//! Exactly one target is active per synthesis run (held by the
//! [`Session`](crate::synth::Session)). Abstract contracts are traits with a
//! fixed constructor shape `(session, scope, id, props)`; the factory picks
//! the implementing type. Narrowing back to a concrete type goes through a
//! tagged variant, never through probing field shapes.

pub mod aws;
mod dispatch;
pub mod gcp;
mod registry;

pub use dispatch::factory_for;
pub use registry::{get_spec, FunctionLimits, Range, ScheduleLimits, TargetSpec};

use crate::error::Result;
use crate::handler::Handler;
use crate::naming::Address;
use crate::synth::Session;
use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A deployment target. One is active per synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Aws,
    Gcp,
}

impl Target {
    /// Stable lowercase key, used in definitions and artifacts.
    pub fn key(self) -> &'static str {
        match self {
            Target::Aws => "aws",
            Target::Gcp => "gcp",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Target-independent function configuration.
#[derive(Debug, Clone)]
pub struct FunctionProps {
    pub handler: Rc<Handler>,
    /// Memory available to the handler, in MB.
    pub memory_mb: u64,
    /// Maximum run time for one invocation, in seconds.
    pub timeout_secs: u64,
    /// Extra environment variables merged into the runtime environment.
    pub env: BTreeMap<String, String>,
}

impl FunctionProps {
    pub fn new(handler: Rc<Handler>) -> Self {
        Self {
            handler,
            memory_mb: 1024,
            timeout_secs: 60,
            env: BTreeMap::new(),
        }
    }
}

/// Target-independent schedule configuration.
#[derive(Debug, Clone)]
pub struct ScheduleProps {
    /// Tick cadence in seconds. Targets render this into their own cadence
    /// syntax (rate expression, cron line).
    pub interval_secs: u64,
}

/// Target-independent bucket configuration.
#[derive(Debug, Clone, Default)]
pub struct BucketProps {
    /// Whether objects are publicly readable.
    pub public: bool,
}

/// A function: callback code invocable on demand.
pub trait FunctionResource {
    fn node(&self) -> NodeId;

    /// Physical name the active target assigned to this function.
    fn physical_name(&self) -> &str;

    /// Deterministic environment variable name carrying this function's
    /// synthesized identity into its own runtime handler.
    fn handle_env_var(&self) -> String;

    /// Narrow to the concrete per-target type.
    fn concrete(&self) -> ConcreteFunction<'_>;
}

/// A schedule: a fixed-cadence trigger that runs handlers.
pub trait ScheduleResource {
    fn node(&self) -> NodeId;

    /// Run `handler` on every tick.
    ///
    /// Memoized by handler identity: passing the same handler instance again
    /// returns the function node created the first time instead of
    /// synthesizing a duplicate. Returns the node of the handler function.
    fn on_tick(&mut self, session: &mut Session, handler: Rc<Handler>) -> Result<NodeId>;

    /// Narrow to the concrete per-target type.
    fn concrete(&self) -> ConcreteSchedule<'_>;
}

/// A bucket: durable object storage.
pub trait BucketResource {
    fn node(&self) -> NodeId;

    /// Physical name the active target assigned to this bucket.
    fn physical_name(&self) -> &str;

    /// Run `handler` whenever an object is created.
    ///
    /// Fails with `HandlerBindingNotSupported` on targets that cannot use a
    /// bucket as a callback binding point - a late, bind-time failure by
    /// design rather than a per-target capability matrix.
    fn on_object_created(&mut self, session: &mut Session, handler: Rc<Handler>)
        -> Result<NodeId>;

    /// Narrow to the concrete per-target type.
    fn concrete(&self) -> ConcreteBucket<'_>;
}

/// Tagged concrete view of a function.
pub enum ConcreteFunction<'a> {
    Aws(&'a aws::AwsFunction),
    Gcp(&'a gcp::GcpFunction),
}

/// Tagged concrete view of a schedule.
pub enum ConcreteSchedule<'a> {
    Aws(&'a aws::AwsSchedule),
    Gcp(&'a gcp::GcpSchedule),
}

/// Tagged concrete view of a bucket.
pub enum ConcreteBucket<'a> {
    Aws(&'a aws::AwsBucket),
    Gcp(&'a gcp::GcpBucket),
}

/// One strategy object per target, resolved by [`factory_for`].
pub trait TargetFactory: Sync {
    fn target(&self) -> Target;

    fn function(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Box<dyn FunctionResource>>;

    fn schedule(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Box<dyn ScheduleResource>>;

    fn bucket(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Box<dyn BucketResource>>;
}

/// View an abstract function as AWS's concrete type, if that is what it is.
pub fn as_aws_function<'a>(f: &'a dyn FunctionResource) -> Option<&'a aws::AwsFunction> {
    match f.concrete() {
        ConcreteFunction::Aws(inner) => Some(inner),
        _ => None,
    }
}

/// View an abstract function as GCP's concrete type, if that is what it is.
pub fn as_gcp_function<'a>(f: &'a dyn FunctionResource) -> Option<&'a gcp::GcpFunction> {
    match f.concrete() {
        ConcreteFunction::Gcp(inner) => Some(inner),
        _ => None,
    }
}

/// View an abstract bucket as AWS's concrete type, if that is what it is.
pub fn as_aws_bucket<'a>(b: &'a dyn BucketResource) -> Option<&'a aws::AwsBucket> {
    match b.concrete() {
        ConcreteBucket::Aws(inner) => Some(inner),
        _ => None,
    }
}

/// View an abstract bucket as GCP's concrete type, if that is what it is.
pub fn as_gcp_bucket<'a>(b: &'a dyn BucketResource) -> Option<&'a gcp::GcpBucket> {
    match b.concrete() {
        ConcreteBucket::Gcp(inner) => Some(inner),
        _ => None,
    }
}

/// Deterministic environment variable name derived from a node address, the
/// convention targets use to pass a resource's synthesized identity into its
/// own runtime handler.
pub fn handle_env_var(kind: &str, addr: &Address) -> String {
    format!(
        "{}_{}",
        kind.to_uppercase(),
        addr.suffix(8).to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_keys() {
        assert_eq!(Target::Aws.key(), "aws");
        assert_eq!(Target::Gcp.to_string(), "gcp");
    }

    #[test]
    fn test_handle_env_var_shape() {
        let addr = Address::of_segments(&["App", "Fn"]);
        let var = handle_env_var("function", &addr);
        assert!(var.starts_with("FUNCTION_"));
        assert_eq!(var.len(), "FUNCTION_".len() + 8);
        assert_eq!(var, var.to_uppercase());
    }

    #[test]
    fn test_handle_env_var_is_deterministic() {
        let addr = Address::of_segments(&["App", "Fn"]);
        assert_eq!(
            handle_env_var("function", &addr),
            handle_env_var("function", &addr)
        );
    }
}
