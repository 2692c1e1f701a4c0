//! GCP target
//!
//! Realizes the abstract resource contracts against Google Cloud: functions
//! become Cloud Functions (with a source-archive bucket), schedules become
//! Cloud Scheduler jobs, buckets become Cloud Storage buckets. Region and
//! project are resolved from tree context so one subtree can be pinned to a
//! different location than the rest of the app.

use super::registry::{check_range, get_spec};
use super::{
    BucketProps, BucketResource, ConcreteBucket, ConcreteFunction, ConcreteSchedule,
    FunctionProps, FunctionResource, ScheduleProps, ScheduleResource, Target, TargetFactory,
};
use crate::error::{Result, SynthError};
use crate::handler::{convert, AdapterSpec, Handler, HandlerIdentity};
use crate::naming::{address_of, resource_name, Address};
use crate::synth::Session;
use crate::tree::NodeId;
use serde_json::json;
use std::collections::HashMap;
use std::rc::Rc;

/// Context key for the deployment region. Defaults to `us-central1`.
pub const CONTEXT_REGION: &str = "gcp/region";

/// Context key for the project id. Defaults to `main`.
pub const CONTEXT_PROJECT: &str = "gcp/project";

fn context_str(session: &Session, node: NodeId, key: &str, default: &str) -> String {
    session
        .tree()
        .try_get_context(node, key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// Cloud Functions-backed function.
#[derive(Debug)]
pub struct GcpFunction {
    node: NodeId,
    physical_name: String,
    address: Address,
    region: String,
    project: String,
}

impl GcpFunction {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Gcp);
        let path = format!("{}/{}", session.tree().path(scope), id);
        check_range(
            &path,
            "memory_mb",
            props.memory_mb,
            spec.function.memory_mb,
            "MB",
            Target::Gcp,
        )?;
        check_range(
            &path,
            "timeout_secs",
            props.timeout_secs,
            spec.function.timeout_secs,
            "seconds",
            Target::Gcp,
        )?;

        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("function")
            .expect("gcp definition carries function naming");
        let physical_name =
            resource_name(&session.tree().segments(node), &address, naming);

        let region = context_str(session, node, CONTEXT_REGION, "us-central1");
        let project = context_str(session, node, CONTEXT_PROJECT, "main");

        let mut env = props.env.clone();
        env.insert(
            super::handle_env_var("function", &address),
            physical_name.clone(),
        );

        session.add_leaf(
            node,
            "google_storage_bucket",
            json!({
                "name": format!("{physical_name}-src"),
                "location": region,
                "purpose": "source-archive",
            }),
        );
        session.add_leaf(
            node,
            "google_cloudfunctions_function",
            json!({
                "name": physical_name,
                "region": region,
                "project": project,
                "entry_point": props.handler.entrypoint.export,
                "source": props.handler.entrypoint.source,
                "available_memory_mb": props.memory_mb,
                "timeout": props.timeout_secs,
                "environment_variables": env,
            }),
        );
        tracing::debug!("gcp function: path={}, name={}", path, physical_name);

        Ok(Self {
            node,
            physical_name,
            address,
            region,
            project,
        })
    }

    /// HTTPS trigger URL of the synthesized function - GCP-only detail,
    /// reachable through the narrowing accessor.
    pub fn https_trigger_url(&self) -> String {
        format!(
            "https://{}-{}.cloudfunctions.net/{}",
            self.region, self.project, self.physical_name
        )
    }
}

impl FunctionResource for GcpFunction {
    fn node(&self) -> NodeId {
        self.node
    }

    fn physical_name(&self) -> &str {
        &self.physical_name
    }

    fn handle_env_var(&self) -> String {
        super::handle_env_var("function", &self.address)
    }

    fn concrete(&self) -> ConcreteFunction<'_> {
        ConcreteFunction::Gcp(self)
    }
}

/// Cloud Scheduler-backed schedule. Each bound handler gets its own job
/// pointing at the handler function.
#[derive(Debug)]
pub struct GcpSchedule {
    node: NodeId,
    job_base_name: String,
    cron: String,
    tasks: HashMap<HandlerIdentity, (Rc<Handler>, NodeId)>,
}

impl GcpSchedule {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Gcp);
        let path = format!("{}/{}", session.tree().path(scope), id);
        check_range(
            &path,
            "interval_secs",
            props.interval_secs,
            spec.schedule.interval_secs,
            "seconds",
            Target::Gcp,
        )?;

        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("schedule")
            .expect("gcp definition carries schedule naming");
        let job_base_name = resource_name(&session.tree().segments(node), &address, naming);

        if props.interval_secs % 60 != 0 {
            tracing::warn!(
                "gcp schedule: path={}, interval {}s rounded up to whole minutes",
                path,
                props.interval_secs
            );
            session.tree_mut().add_metadata(
                node,
                "warning",
                json!(format!(
                    "interval {}s rounded up to whole minutes",
                    props.interval_secs
                )),
                None,
            );
        }
        let minutes = props.interval_secs.div_ceil(60);
        let cron = if minutes < 60 {
            format!("*/{minutes} * * * *")
        } else {
            if minutes % 60 != 0 {
                tracing::warn!(
                    "gcp schedule: path={}, cadence rounded to whole hours",
                    path
                );
            }
            format!("0 */{} * * *", minutes.div_ceil(60))
        };

        Ok(Self {
            node,
            job_base_name,
            cron,
            tasks: HashMap::new(),
        })
    }
}

impl ScheduleResource for GcpSchedule {
    fn node(&self) -> NodeId {
        self.node
    }

    fn on_tick(&mut self, session: &mut Session, handler: Rc<Handler>) -> Result<NodeId> {
        if let Some((_, existing)) = self.tasks.get(&Handler::identity(&handler)) {
            tracing::debug!(
                "on_tick: handler already bound, reusing {}",
                session.tree().path(*existing)
            );
            return Ok(*existing);
        }

        let adapter = AdapterSpec::new("wrappers/gcp-schedule-tick.js", "SchedulerJobAdapter");
        let converted = convert(Rc::clone(&handler), &adapter);

        let id = format!("OnTick{}", self.tasks.len());
        let function = GcpFunction::new(session, self.node, &id, FunctionProps::new(converted))?;
        let fn_node = function.node;

        session.add_leaf(
            fn_node,
            "google_cloud_scheduler_job",
            json!({
                "name": format!("{}-{}", self.job_base_name, self.tasks.len()),
                "schedule": self.cron,
                "http_target": function.https_trigger_url(),
            }),
        );
        session.add_leaf(
            fn_node,
            "google_cloudfunctions_function_iam_member",
            json!({
                "cloud_function": function.physical_name,
                "role": "roles/cloudfunctions.invoker",
                "member": "serviceAccount:cloud-scheduler",
            }),
        );
        session.tree_mut().add_dependency(fn_node, self.node);
        session.connect(self.node, fn_node, "onTick");

        self.tasks.insert(Handler::identity(&handler), (handler, fn_node));
        Ok(fn_node)
    }

    fn concrete(&self) -> ConcreteSchedule<'_> {
        ConcreteSchedule::Gcp(self)
    }
}

/// Cloud Storage-backed bucket.
#[derive(Debug)]
pub struct GcpBucket {
    node: NodeId,
    physical_name: String,
}

impl GcpBucket {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Gcp);
        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("bucket")
            .expect("gcp definition carries bucket naming");
        let base = resource_name(&session.tree().segments(node), &address, naming);

        // Storage names are global; add a random suffix on top of the
        // tree-scoped address.
        let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let physical_name = format!("{base}-{suffix}");

        let region = context_str(session, node, CONTEXT_REGION, "us-central1");

        session.add_leaf(
            node,
            "random_id",
            json!({
                "keeper": address.as_str(),
                "hex": suffix,
            }),
        );
        session.add_leaf(
            node,
            "google_storage_bucket",
            json!({
                "name": physical_name,
                "location": region,
                "uniform_bucket_level_access": true,
                "public": props.public,
            }),
        );

        Ok(Self {
            node,
            physical_name,
        })
    }

    /// Public endpoint of the synthesized bucket - GCP-only detail,
    /// reachable through the narrowing accessor.
    pub fn endpoint_url(&self) -> String {
        format!("https://storage.googleapis.com/{}", self.physical_name)
    }
}

impl BucketResource for GcpBucket {
    fn node(&self) -> NodeId {
        self.node
    }

    fn physical_name(&self) -> &str {
        &self.physical_name
    }

    fn on_object_created(
        &mut self,
        session: &mut Session,
        _handler: Rc<Handler>,
    ) -> Result<NodeId> {
        // Bucket notifications are not wired up for this target; fail at bind
        // time instead of keeping a capability matrix.
        Err(SynthError::HandlerBindingNotSupported {
            target: Target::Gcp.key().to_string(),
            kind: "bucket".to_string(),
            path: session.tree().path(self.node),
        })
    }

    fn concrete(&self) -> ConcreteBucket<'_> {
        ConcreteBucket::Gcp(self)
    }
}

/// The GCP strategy object.
pub struct GcpFactory;

impl TargetFactory for GcpFactory {
    fn target(&self) -> Target {
        Target::Gcp
    }

    fn function(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Box<dyn FunctionResource>> {
        Ok(Box::new(GcpFunction::new(session, scope, id, props)?))
    }

    fn schedule(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Box<dyn ScheduleResource>> {
        Ok(Box::new(GcpSchedule::new(session, scope, id, props)?))
    }

    fn bucket(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Box<dyn BucketResource>> {
        Ok(Box::new(GcpBucket::new(session, scope, id, props)?))
    }
}
