//! Cross-cloud resource synthesis.
//!
//! One abstract resource model - functions, schedules, buckets - realized
//! against multiple deployment targets, each composing different low-level
//! provider resources to satisfy the same contract.
//!
//! # Architecture
//!
//! - [`tree`] - the construct tree: scopes, context, dependencies, metadata,
//!   validation, locking
//! - [`naming`] - stable 42-character addresses and provider-legal physical
//!   names derived from tree paths
//! - [`connections`] - append-only registry of named relations between nodes,
//!   serialized for external visualization tooling
//! - [`target`] - abstract resource contracts with one implementation per
//!   target, resolved through a factory at synthesis time
//! - [`handler`] - target-agnostic callbacks and their conversion into
//!   target-specific trigger adapters
//! - [`synth`] - the session driving one synthesis run and writing artifacts
//!
//! # Example
//!
//! ```ignore
//! use cloudtree::synth::Session;
//! use cloudtree::target::{ScheduleProps, Target};
//! use cloudtree::handler::Handler;
//!
//! let mut session = Session::new(Target::Aws, "App");
//! let root = session.tree().root();
//! let mut schedule = session.new_schedule(root, "Nightly",
//!     ScheduleProps { interval_secs: 3600 })?;
//! schedule.on_tick(&mut session, Handler::bare("handlers/report.w", "ReportClient"))?;
//! session.synth(std::path::Path::new("target/cloudtree.out"))?;
//! ```

pub mod connections;
pub mod error;
pub mod handler;
pub mod naming;
pub mod synth;
pub mod target;
pub mod tree;

pub use error::{Result, SynthError};

/// Version injected at compile time via CLOUDTREE_VERSION env var (set by
/// CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("CLOUDTREE_VERSION") {
    Some(v) => v,
    None => "dev",
};
