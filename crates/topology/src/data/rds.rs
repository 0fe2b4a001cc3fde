//! PostgreSQL primary and read-replica declarations.

use serde::{Deserialize, Serialize};

use crate::resources::RemovalPolicy;

/// The primary database instance declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbInstanceSpec {
    /// Canonical instance identifier.
    pub identifier: String,

    pub engine: String,
    pub engine_version: String,

    pub instance_type: String,

    pub vpc: String,

    /// Placed in the private (egress) subnet group.
    pub subnet_group: String,

    pub security_group: String,

    pub multi_az: bool,
    pub allocated_storage_gib: u32,

    pub publicly_accessible: bool,

    /// Allow IAM database authentication alongside password auth.
    pub iam_authentication: bool,

    /// Secret holding the generated admin credentials.
    pub credentials_secret: String,

    pub admin_user: String,
    pub database_name: String,

    pub backup_retention_days: u32,

    pub deletion_protection: bool,
    pub removal_policy: RemovalPolicy,

    pub storage_encrypted: bool,

    /// KMS alias for storage encryption; absent uses the provider-managed
    /// key.
    pub storage_kms_alias: Option<String>,

    /// Engine log categories exported to the log service.
    pub log_exports: Vec<String>,

    /// Retention for the exported engine logs, in days.
    pub log_export_retention_days: u32,
}

/// A read replica of the primary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DbReplicaSpec {
    /// Canonical instance identifier.
    pub identifier: String,

    /// Identifier of the source instance.
    pub source: String,

    pub instance_type: String,

    pub vpc: String,
    pub subnet_group: String,

    pub publicly_accessible: bool,
    pub deletion_protection: bool,
    pub removal_policy: RemovalPolicy,
}

/// PostgreSQL listens here unless configured otherwise.
pub const POSTGRES_PORT: u16 = 5432;
