//! The composition plan: stacks, their resources, outputs, and the
//! explicit dependency graph between tiers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certificate::CertificateSpec;
use crate::compute::dashboard::{DistributionSpec, OriginAccessIdentitySpec};
use crate::compute::ecs::{
    ClusterSpec, EcrRepositorySpec, GuardDutyDetectorSpec, ImageAssetSpec, LoadBalancerSpec,
    ServiceSpec, TaskDefinitionSpec, WafWebAclSpec,
};
use crate::compute::observability::{AlarmSpec, AlarmTopicSpec, LogGroupSpec};
use crate::data::db_init::{DbInitFunctionSpec, DbInitTriggerSpec};
use crate::data::rds::{DbInstanceSpec, DbReplicaSpec};
use crate::dns::DnsRecordSpec;
use crate::error::{ComposeError, Warning};
use crate::network::nat_instance::NatInstanceSpec;
use crate::network::vpc::VpcSpec;
use crate::resources::{BucketSpec, SecurityGroupIngressSpec, SecurityGroupSpec, ValueRef};

/// Logical grouping of a stack's declarations, with a fixed dependency
/// direction: compute → data → network, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Network,
    Data,
    Compute,
}

/// A single declared resource.
///
/// Cross-resource references are by canonical name; [`Resource::name`]
/// exposes each declaration's identity (for attachment-style resources
/// like ingress rules and DNS records, the resource they attach to).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Vpc(VpcSpec),
    SecurityGroup(SecurityGroupSpec),
    SecurityGroupIngress(SecurityGroupIngressSpec),
    NatInstance(NatInstanceSpec),
    DbInstance(DbInstanceSpec),
    DbReplica(DbReplicaSpec),
    DbInitFunction(DbInitFunctionSpec),
    DbInitTrigger(DbInitTriggerSpec),
    LogGroup(LogGroupSpec),
    AlarmTopic(AlarmTopicSpec),
    Alarm(AlarmSpec),
    Bucket(BucketSpec),
    EcrRepository(EcrRepositorySpec),
    ImageAsset(ImageAssetSpec),
    EcsCluster(ClusterSpec),
    TaskDefinition(TaskDefinitionSpec),
    FargateService(ServiceSpec),
    LoadBalancer(LoadBalancerSpec),
    Certificate(CertificateSpec),
    DnsRecord(DnsRecordSpec),
    OriginAccessIdentity(OriginAccessIdentitySpec),
    Distribution(DistributionSpec),
    WafWebAcl(WafWebAclSpec),
    GuardDutyDetector(GuardDutyDetectorSpec),
}

impl Resource {
    /// The declaration's plan-level identity.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Resource::Vpc(spec) => &spec.name,
            Resource::SecurityGroup(spec) => &spec.name,
            Resource::SecurityGroupIngress(spec) => &spec.security_group,
            Resource::NatInstance(spec) => &spec.name,
            Resource::DbInstance(spec) => &spec.identifier,
            Resource::DbReplica(spec) => &spec.identifier,
            Resource::DbInitFunction(spec) => &spec.name,
            Resource::DbInitTrigger(spec) => &spec.name,
            Resource::LogGroup(spec) => &spec.name,
            Resource::AlarmTopic(spec) => &spec.name,
            Resource::Alarm(spec) => &spec.name,
            Resource::Bucket(spec) => &spec.name,
            Resource::EcrRepository(spec) => &spec.name,
            Resource::ImageAsset(spec) => &spec.name,
            Resource::EcsCluster(spec) => &spec.name,
            Resource::TaskDefinition(spec) => &spec.family,
            Resource::FargateService(spec) => &spec.name,
            Resource::LoadBalancer(spec) => &spec.name,
            Resource::Certificate(spec) => &spec.name,
            Resource::DnsRecord(spec) => &spec.alias_target,
            Resource::OriginAccessIdentity(spec) => &spec.name,
            Resource::Distribution(spec) => &spec.name,
            Resource::WafWebAcl(spec) => &spec.name,
            Resource::GuardDutyDetector(spec) => &spec.name,
        }
    }
}

/// A provisioning-time output exported by a stack.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StackOutput {
    pub key: String,
    pub value: ValueRef,
    pub description: Option<String>,
}

/// One tier's declarations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StackPlan {
    /// Stable stack id, `{tier}-{environment}`.
    pub id: String,

    pub tier: Tier,

    pub environment: String,

    /// Applied tag map (including the derived `Environment` tag).
    pub tags: BTreeMap<String, String>,

    /// Ids of stacks that must be resolved before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,

    pub resources: Vec<Resource>,

    #[serde(default)]
    pub outputs: Vec<StackOutput>,
}

/// The ordered, acyclic set of stacks composed for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopologyPlan {
    pub environment: String,
    pub region: String,

    pub generated_at: DateTime<Utc>,

    /// Stacks in declaration order (network, data, compute).
    pub stacks: Vec<StackPlan>,

    /// Non-fatal conditions surfaced during composition.
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl TopologyPlan {
    /// Looks up a stack by id.
    #[must_use]
    pub fn stack(&self, id: &str) -> Option<&StackPlan> {
        self.stacks.iter().find(|stack| stack.id == id)
    }

    /// Verifies the dependency graph structurally and returns the stack ids
    /// in a valid provisioning order.
    ///
    /// # Errors
    ///
    /// [`ComposeError::UnknownDependency`] for a reference to a stack that
    /// is not part of the plan; [`ComposeError::DependencyCycle`] when no
    /// topological order exists.
    pub fn toposort(&self) -> Result<Vec<&str>, ComposeError> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .stacks
            .iter()
            .map(|stack| (stack.id.as_str(), stack.depends_on.len()))
            .collect();

        for stack in &self.stacks {
            for dependency in &stack.depends_on {
                if !in_degree.contains_key(dependency.as_str()) {
                    return Err(ComposeError::UnknownDependency {
                        stack: stack.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut ordered = Vec::with_capacity(self.stacks.len());
        while ordered.len() < self.stacks.len() {
            let Some(next) = self.stacks.iter().find(|stack| {
                in_degree.get(stack.id.as_str()) == Some(&0)
                    && !ordered.contains(&stack.id.as_str())
            }) else {
                // Every remaining stack still waits on a dependency.
                let stuck = self
                    .stacks
                    .iter()
                    .find(|stack| !ordered.contains(&stack.id.as_str()))
                    .map_or_else(String::new, |stack| stack.id.clone());
                return Err(ComposeError::DependencyCycle { stack: stuck });
            };

            ordered.push(next.id.as_str());
            for stack in &self.stacks {
                if stack.depends_on.iter().any(|dep| dep == &next.id) {
                    if let Some(degree) = in_degree.get_mut(stack.id.as_str()) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
        }

        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stack(id: &str, tier: Tier, depends_on: &[&str]) -> StackPlan {
        StackPlan {
            id: id.to_string(),
            tier,
            environment: "dev".to_string(),
            tags: BTreeMap::new(),
            depends_on: depends_on.iter().map(ToString::to_string).collect(),
            resources: vec![],
            outputs: vec![],
        }
    }

    fn plan(stacks: Vec<StackPlan>) -> TopologyPlan {
        TopologyPlan {
            environment: "dev".to_string(),
            region: "us-east-1".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            stacks,
            warnings: vec![],
        }
    }

    #[test]
    fn toposort_orders_tiers() {
        let plan = plan(vec![
            stack("app-dev", Tier::Compute, &["network-dev", "data-dev"]),
            stack("data-dev", Tier::Data, &["network-dev"]),
            stack("network-dev", Tier::Network, &[]),
        ]);

        let ordered = plan.toposort().unwrap();
        let position = |id: &str| ordered.iter().position(|s| *s == id).unwrap();
        assert!(position("network-dev") < position("data-dev"));
        assert!(position("data-dev") < position("app-dev"));
    }

    #[test]
    fn toposort_rejects_cycles() {
        let plan = plan(vec![
            stack("network-dev", Tier::Network, &["app-dev"]),
            stack("data-dev", Tier::Data, &["network-dev"]),
            stack("app-dev", Tier::Compute, &["data-dev"]),
        ]);

        assert!(matches!(
            plan.toposort().unwrap_err(),
            ComposeError::DependencyCycle { .. }
        ));
    }

    #[test]
    fn toposort_rejects_unknown_dependencies() {
        let plan = plan(vec![stack("data-dev", Tier::Data, &["network-prd"])]);

        assert!(matches!(
            plan.toposort().unwrap_err(),
            ComposeError::UnknownDependency { ref dependency, .. } if dependency == "network-prd"
        ));
    }
}
