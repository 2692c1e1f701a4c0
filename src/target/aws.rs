//! AWS target
//!
//! Realizes the abstract resource contracts against AWS: functions become
//! Lambda functions behind an IAM role, schedules become EventBridge rules,
//! buckets become S3 buckets with a random-suffix leaf for global uniqueness.
//! Leaf provider resources are recorded as opaque `(kind, props)` entries on
//! the session; wiring them to real provider SDK calls happens downstream.

use super::registry::{check_range, get_spec};
use super::{
    BucketProps, BucketResource, ConcreteBucket, ConcreteFunction, ConcreteSchedule,
    FunctionProps, FunctionResource, ScheduleProps, ScheduleResource, Target, TargetFactory,
};
use crate::error::Result;
use crate::handler::{convert, AdapterSpec, Handler, HandlerIdentity};
use crate::naming::{address_of, resource_name, Address};
use crate::synth::Session;
use crate::tree::NodeId;
use serde_json::json;
use std::collections::HashMap;
use std::rc::Rc;

/// Lambda-backed function.
#[derive(Debug)]
pub struct AwsFunction {
    node: NodeId,
    physical_name: String,
    address: Address,
}

impl AwsFunction {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Aws);
        let path = format!("{}/{}", session.tree().path(scope), id);
        check_range(
            &path,
            "memory_mb",
            props.memory_mb,
            spec.function.memory_mb,
            "MB",
            Target::Aws,
        )?;
        check_range(
            &path,
            "timeout_secs",
            props.timeout_secs,
            spec.function.timeout_secs,
            "seconds",
            Target::Aws,
        )?;

        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("function")
            .expect("aws definition carries function naming");
        let physical_name =
            resource_name(&session.tree().segments(node), &address, naming);

        let mut env = props.env.clone();
        env.insert(
            super::handle_env_var("function", &address),
            physical_name.clone(),
        );

        session.add_leaf(
            node,
            "aws_iam_role",
            json!({
                "name": format!("{physical_name}-role"),
                "assume_role_service": "lambda.amazonaws.com",
            }),
        );
        session.add_leaf(
            node,
            "aws_lambda_function",
            json!({
                "function_name": physical_name,
                "handler": format!(
                    "{}#{}",
                    props.handler.entrypoint.source, props.handler.entrypoint.export
                ),
                "memory_size": props.memory_mb,
                "timeout": props.timeout_secs,
                "environment": env,
            }),
        );
        tracing::debug!("aws function: path={}, name={}", path, physical_name);

        Ok(Self {
            node,
            physical_name,
            address,
        })
    }

    /// ARN of the synthesized Lambda function - AWS-only detail, reachable
    /// through the narrowing accessor.
    pub fn function_arn(&self) -> String {
        format!("arn:aws:lambda:::function:{}", self.physical_name)
    }
}

impl FunctionResource for AwsFunction {
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
        ConcreteFunction::Aws(self)
    }
}

/// EventBridge-backed schedule.
#[derive(Debug)]
pub struct AwsSchedule {
    node: NodeId,
    rule_name: String,
    // Keyed by handler identity; the original handler rides along so the
    // identity cannot be reused by a later allocation.
    tasks: HashMap<HandlerIdentity, (Rc<Handler>, NodeId)>,
}

impl AwsSchedule {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Aws);
        let path = format!("{}/{}", session.tree().path(scope), id);
        check_range(
            &path,
            "interval_secs",
            props.interval_secs,
            spec.schedule.interval_secs,
            "seconds",
            Target::Aws,
        )?;

        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("schedule")
            .expect("aws definition carries schedule naming");
        let rule_name = resource_name(&session.tree().segments(node), &address, naming);

        if props.interval_secs % 60 != 0 {
            tracing::warn!(
                "aws schedule: path={}, interval {}s rounded up to whole minutes",
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
        let expression = if minutes == 1 {
            "rate(1 minute)".to_string()
        } else {
            format!("rate({minutes} minutes)")
        };

        session.add_leaf(
            node,
            "aws_cloudwatch_event_rule",
            json!({
                "name": rule_name,
                "schedule_expression": expression,
            }),
        );

        Ok(Self {
            node,
            rule_name,
            tasks: HashMap::new(),
        })
    }
}

impl ScheduleResource for AwsSchedule {
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

        let adapter = AdapterSpec::new("wrappers/aws-schedule-tick.js", "ScheduleTickAdapter");
        let converted = convert(Rc::clone(&handler), &adapter);

        let id = format!("OnTick{}", self.tasks.len());
        let function = AwsFunction::new(session, self.node, &id, FunctionProps::new(converted))?;
        let fn_node = function.node;

        session.add_leaf(
            fn_node,
            "aws_lambda_permission",
            json!({
                "function_name": function.physical_name,
                "principal": "events.amazonaws.com",
                "source_rule": self.rule_name,
            }),
        );
        session.add_leaf(
            fn_node,
            "aws_cloudwatch_event_target",
            json!({
                "rule": self.rule_name,
                "arn": function.function_arn(),
            }),
        );
        session.tree_mut().add_dependency(fn_node, self.node);
        session.connect(self.node, fn_node, "onTick");

        self.tasks.insert(Handler::identity(&handler), (handler, fn_node));
        Ok(fn_node)
    }

    fn concrete(&self) -> ConcreteSchedule<'_> {
        ConcreteSchedule::Aws(self)
    }
}

/// S3-backed bucket.
#[derive(Debug)]
pub struct AwsBucket {
    node: NodeId,
    physical_name: String,
    notifications: HashMap<HandlerIdentity, (Rc<Handler>, NodeId)>,
}

impl AwsBucket {
    pub(crate) fn new(
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Self> {
        let spec = get_spec(Target::Aws);
        let node = session.tree_mut().add_child(scope, id)?;
        let address = address_of(session.tree(), node);
        let naming = spec
            .naming("bucket")
            .expect("aws definition carries bucket naming");
        let base = resource_name(&session.tree().segments(node), &address, naming);

        // S3 names are global across accounts; the address only disambiguates
        // within one tree, so a random suffix rides on top of it.
        let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let physical_name = format!("{base}-{suffix}");

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
            "aws_s3_bucket",
            json!({
                "bucket": physical_name,
                "acl": if props.public { "public-read" } else { "private" },
                "force_destroy": true,
            }),
        );

        Ok(Self {
            node,
            physical_name,
            notifications: HashMap::new(),
        })
    }

    /// ARN of the synthesized S3 bucket.
    pub fn bucket_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.physical_name)
    }
}

impl BucketResource for AwsBucket {
    fn node(&self) -> NodeId {
        self.node
    }

    fn physical_name(&self) -> &str {
        &self.physical_name
    }

    fn on_object_created(
        &mut self,
        session: &mut Session,
        handler: Rc<Handler>,
    ) -> Result<NodeId> {
        if let Some((_, existing)) = self.notifications.get(&Handler::identity(&handler)) {
            return Ok(*existing);
        }

        let adapter = AdapterSpec::new("wrappers/aws-bucket-event.js", "BucketEventAdapter");
        let converted = convert(Rc::clone(&handler), &adapter);

        let id = format!("OnCreate{}", self.notifications.len());
        let function = AwsFunction::new(session, self.node, &id, FunctionProps::new(converted))?;
        let fn_node = function.node;

        session.add_leaf(
            fn_node,
            "aws_lambda_permission",
            json!({
                "function_name": function.physical_name,
                "principal": "s3.amazonaws.com",
                "source_bucket": self.physical_name,
            }),
        );
        session.add_leaf(
            fn_node,
            "aws_s3_bucket_notification",
            json!({
                "bucket": self.physical_name,
                "events": ["s3:ObjectCreated:*"],
                "function_arn": function.function_arn(),
            }),
        );
        session.tree_mut().add_dependency(fn_node, self.node);
        session.connect(self.node, fn_node, "onObjectCreated");

        self.notifications.insert(Handler::identity(&handler), (handler, fn_node));
        Ok(fn_node)
    }

    fn concrete(&self) -> ConcreteBucket<'_> {
        ConcreteBucket::Aws(self)
    }
}

/// The AWS strategy object.
pub struct AwsFactory;

impl TargetFactory for AwsFactory {
    fn target(&self) -> Target {
        Target::Aws
    }

    fn function(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<Box<dyn FunctionResource>> {
        Ok(Box::new(AwsFunction::new(session, scope, id, props)?))
    }

    fn schedule(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: ScheduleProps,
    ) -> Result<Box<dyn ScheduleResource>> {
        Ok(Box::new(AwsSchedule::new(session, scope, id, props)?))
    }

    fn bucket(
        &self,
        session: &mut Session,
        scope: NodeId,
        id: &str,
        props: BucketProps,
    ) -> Result<Box<dyn BucketResource>> {
        Ok(Box::new(AwsBucket::new(session, scope, id, props)?))
    }
}
