//! Shared resource primitives used across the tiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value in the plan that is either known at composition time or resolved
/// by the provisioning engine from a declared resource's attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ValueRef {
    /// Known at composition time.
    Literal { value: String },

    /// Resolved at provisioning time from another resource.
    Attribute { resource: String, attribute: String },
}

impl ValueRef {
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        ValueRef::Literal {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn attribute(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        ValueRef::Attribute {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }
}

/// Reference to one field of a secret.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretRef {
    /// Canonical name of the secret.
    pub secret: String,

    /// JSON field inside the secret payload.
    pub json_field: String,
}

/// What happens to a resource when its declaration is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Retain,
    Destroy,
}

/// Source of an ingress rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "peer", rename_all = "snake_case")]
pub enum IngressPeer {
    /// An IPv4 CIDR block.
    Cidr { cidr: String },

    /// Another declared resource (its security perimeter).
    Resource { resource: String },
}

/// One ingress rule on a security group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngressRule {
    pub source: IngressPeer,

    /// `tcp`, `udp`, or `all`.
    pub protocol: String,

    /// Absent for protocol `all`.
    pub from_port: Option<u16>,
    pub to_port: Option<u16>,

    pub description: String,
}

/// A security group declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecurityGroupSpec {
    /// Canonical name.
    pub name: String,

    /// VPC the group belongs to.
    pub vpc: String,

    pub description: String,
    pub allow_all_outbound: bool,

    #[serde(default)]
    pub ingress: Vec<IngressRule>,
}

/// An ingress rule attached to a security group declared elsewhere (used to
/// open a perimeter from a dependent tier without mutating the owning
/// tier's declaration).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecurityGroupIngressSpec {
    /// The security group being opened.
    pub security_group: String,

    pub rule: IngressRule,
}

/// An object-storage bucket declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BucketSpec {
    /// Canonical name (plan-level identity).
    pub name: String,

    /// Explicit globally unique bucket name; absent lets the provisioning
    /// engine generate one.
    pub bucket_name: Option<String>,

    /// Provider-managed encryption at rest.
    pub encryption: String,

    pub block_public_access: bool,

    /// Reject non-TLS access.
    pub enforce_tls: bool,

    pub versioned: bool,

    /// Days before objects expire; absent disables the lifecycle rule.
    pub expiration_days: Option<u32>,

    pub removal_policy: RemovalPolicy,
    pub auto_delete_objects: bool,
}

/// An IAM policy statement attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// A metric identity for alarm declarations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricSpec {
    pub namespace: String,
    pub metric_name: String,

    #[serde(default)]
    pub dimensions: BTreeMap<String, ValueRef>,

    /// `Average`, `Sum`, ...
    pub statistic: String,

    pub period_seconds: u32,
}
