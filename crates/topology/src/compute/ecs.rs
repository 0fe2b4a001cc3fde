//! Container-orchestration declarations: cluster, task definition,
//! service, autoscaling, and the load balancer in front of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::certificate::CertificateRef;
use crate::resources::{PolicyStatement, RemovalPolicy, SecretRef, ValueRef};

/// A declared container registry repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EcrRepositorySpec {
    /// Repository name (also its plan-level identity; registry
    /// repositories are externally named).
    pub name: String,

    pub image_scan_on_push: bool,
    pub removal_policy: RemovalPolicy,

    /// Lifecycle rule: keep at most this many images.
    pub max_image_count: u32,
}

/// A deploy-time image build from the application source tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageAssetSpec {
    /// Canonical name.
    pub name: String,

    /// Build context directory relative to the repository root.
    pub context_directory: String,
}

/// The image a container runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "image", rename_all = "snake_case")]
pub enum ContainerImage {
    /// A deploy-time build declared in this plan.
    Asset { asset: String },

    /// A registry pull.
    Registry { repository: String, tag: String },
}

/// The cluster declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterSpec {
    /// Canonical name.
    pub name: String,

    pub vpc: String,
}

/// Container log wiring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Name of the log group declared by the observability layer.
    pub log_group: String,

    pub stream_prefix: String,
}

/// The application container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContainerSpec {
    /// Canonical name.
    pub name: String,

    pub image: ContainerImage,

    pub port_mappings: Vec<u16>,

    pub log: LogConfig,

    /// Plain environment; provision-time values are attribute references.
    pub environment: BTreeMap<String, ValueRef>,

    /// Values injected from secrets, never inlined in the plan.
    pub secrets: BTreeMap<String, SecretRef>,
}

/// The task definition declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskDefinitionSpec {
    /// Canonical family name.
    pub family: String,

    /// CPU units (1024 = 1 vCPU).
    pub cpu: u32,

    pub memory_mib: u32,

    /// Policies attached to the task role.
    pub task_role_policies: Vec<PolicyStatement>,

    /// Repository the execution role may pull from; absent for asset
    /// images.
    pub pull_from: Option<String>,

    pub container: ContainerSpec,
}

/// Deployment circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CircuitBreaker {
    pub enable: bool,
    pub rollback: bool,
}

/// One autoscaling policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ScalingPolicy {
    CpuUtilization {
        target_utilization_percent: u32,
        scale_in_cooldown_seconds: u32,
        scale_out_cooldown_seconds: u32,
    },
    MemoryUtilization {
        target_utilization_percent: u32,
        scale_in_cooldown_seconds: u32,
        scale_out_cooldown_seconds: u32,
    },
    RequestCountPerTarget {
        requests_per_target: u32,
        target_group: String,
        scale_in_cooldown_seconds: u32,
        scale_out_cooldown_seconds: u32,
    },
}

/// Task-count autoscaling bounds and policies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutoscalingSpec {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub policies: Vec<ScalingPolicy>,
}

/// The service declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceSpec {
    /// Canonical name.
    pub name: String,

    pub cluster: String,
    pub task_definition: String,

    pub desired_count: u32,
    pub assign_public_ip: bool,

    pub security_groups: Vec<String>,

    pub circuit_breaker: CircuitBreaker,

    pub autoscaling: AutoscalingSpec,
}

/// The listener target group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetGroupSpec {
    /// Canonical name.
    pub name: String,

    /// Traffic port on the targets.
    pub port: u16,

    /// Canonical name of the service being targeted.
    pub targets: String,

    pub health_check_path: String,
}

/// What a listener does with incoming traffic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ListenerAction {
    Forward { target_group: String },

    /// Permanent redirect to the HTTPS listener.
    RedirectToHttps { port: u16 },
}

/// One load balancer listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListenerSpec {
    pub port: u16,

    /// `HTTP` or `HTTPS`.
    pub protocol: String,

    /// TLS termination; present only on HTTPS listeners.
    pub certificate: Option<CertificateRef>,

    /// Listener accepts traffic from anywhere.
    pub open: bool,

    pub action: ListenerAction,
}

/// Access-log delivery for the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessLogConfig {
    /// Canonical name of the access-log bucket.
    pub bucket: String,

    pub prefix: String,
}

/// The load balancer declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoadBalancerSpec {
    /// Canonical name.
    pub name: String,

    pub vpc: String,
    pub internet_facing: bool,

    pub access_logs: Option<AccessLogConfig>,

    pub listeners: Vec<ListenerSpec>,

    pub target_group: TargetGroupSpec,
}

/// A regional web ACL attached to the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WafWebAclSpec {
    /// Canonical name.
    pub name: String,

    pub metric_name: String,

    pub scope: String,

    /// `allow`; the ACL observes by default.
    pub default_action: String,

    pub cloudwatch_metrics_enabled: bool,
    pub sampled_requests_enabled: bool,

    /// Canonical name of the load balancer the ACL is associated with.
    pub associate_with: String,
}

/// A threat-detection detector for the account/region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuardDutyDetectorSpec {
    /// Canonical name.
    pub name: String,

    pub enable: bool,
}
