//! Data tier: the PostgreSQL primary (and optional replica) plus the
//! one-shot initialization routine.
//!
//! Depends only on the network tier's outputs: subnet placement and the
//! VPC the security perimeter lives in.

pub mod db_init;
pub mod rds;

use std::collections::BTreeMap;

use tracing::info;

use crate::compose::TierContext;
use crate::network::NetworkOutputs;
use crate::plan::{Resource, StackPlan, Tier};
use crate::resources::{
    IngressPeer, IngressRule, PolicyStatement, RemovalPolicy, SecurityGroupIngressSpec,
    SecurityGroupSpec, ValueRef,
};

use db_init::{DbInitFunctionSpec, DbInitTriggerSpec, TriggerEvent};
use rds::{DbInstanceSpec, DbReplicaSpec, POSTGRES_PORT};

/// Exported engine logs are short-lived; they exist for incident triage,
/// not audit.
const ENGINE_LOG_RETENTION_DAYS: u32 = 7;

/// References the compute tier needs from the data tier.
#[derive(Debug, Clone)]
pub struct DataOutputs {
    /// Canonical identifier of the primary instance.
    pub instance: String,

    /// Endpoint address, resolved at provisioning time.
    pub endpoint: ValueRef,

    /// Secret holding the admin credentials.
    pub credentials_secret: String,

    /// The database security perimeter (for ingress grants).
    pub security_group: String,

    pub port: u16,

    pub database_name: String,
    pub admin_user: String,
}

/// The declared data stack plus the references dependents need.
#[derive(Debug)]
pub struct DataTier {
    pub stack: StackPlan,
    pub outputs: DataOutputs,
}

/// Declares the data tier.
#[must_use]
pub fn declare(ctx: &TierContext<'_>, network: &NetworkOutputs) -> DataTier {
    let rds = &ctx.settings.rds;
    let security = &ctx.globals.security;

    let identifier = ctx.namer.resource("rds");
    let security_group = ctx.namer.resource("sg-rds");
    let credentials_secret = ctx.namer.resource("rds-credentials");
    let endpoint = ValueRef::attribute(identifier.clone(), "endpoint_address");

    let mut resources = vec![
        Resource::SecurityGroup(SecurityGroupSpec {
            name: security_group.clone(),
            vpc: network.vpc.clone(),
            description: "Security group for the PostgreSQL instance".to_string(),
            allow_all_outbound: true,
            ingress: vec![],
        }),
        Resource::DbInstance(DbInstanceSpec {
            identifier: identifier.clone(),
            engine: "postgres".to_string(),
            engine_version: "16".to_string(),
            instance_type: rds.instance_type.clone(),
            vpc: network.vpc.clone(),
            subnet_group: network.private_subnet_group.clone(),
            security_group: security_group.clone(),
            multi_az: rds.multi_az,
            allocated_storage_gib: rds.allocated_storage_gib,
            publicly_accessible: false,
            iam_authentication: true,
            credentials_secret: credentials_secret.clone(),
            admin_user: rds.admin_user.clone(),
            database_name: rds.database_name.clone(),
            backup_retention_days: rds.backup_retention_days,
            deletion_protection: true,
            removal_policy: RemovalPolicy::Retain,
            storage_encrypted: security.enforce_encryption_at_rest,
            storage_kms_alias: security.kms_aliases.rds.clone(),
            log_exports: vec!["postgresql".to_string()],
            log_export_retention_days: ENGINE_LOG_RETENTION_DAYS,
        }),
    ];

    if rds.enable_replica {
        resources.push(Resource::DbReplica(DbReplicaSpec {
            identifier: ctx.namer.resource("rds-replica"),
            source: identifier.clone(),
            instance_type: rds.instance_type.clone(),
            vpc: network.vpc.clone(),
            subnet_group: network.private_subnet_group.clone(),
            publicly_accessible: false,
            deletion_protection: true,
            removal_policy: RemovalPolicy::Retain,
        }));
    }

    resources.extend(declare_db_init(
        ctx,
        network,
        &endpoint,
        &credentials_secret,
        &security_group,
    ));

    info!(
        environment = ctx.env_name,
        instance = %identifier,
        multi_az = rds.multi_az,
        replica = rds.enable_replica,
        "declared data tier"
    );

    DataTier {
        stack: StackPlan {
            id: format!("data-{}", ctx.env_name),
            tier: Tier::Data,
            environment: ctx.env_name.to_string(),
            tags: ctx.tags.clone(),
            depends_on: vec![format!("network-{}", ctx.env_name)],
            resources,
            outputs: vec![],
        },
        outputs: DataOutputs {
            instance: identifier,
            endpoint,
            credentials_secret,
            security_group,
            port: POSTGRES_PORT,
            database_name: rds.database_name.clone(),
            admin_user: rds.admin_user.clone(),
        },
    }
}

fn declare_db_init(
    ctx: &TierContext<'_>,
    network: &NetworkOutputs,
    endpoint: &ValueRef,
    credentials_secret: &str,
    db_security_group: &str,
) -> Vec<Resource> {
    let rds = &ctx.settings.rds;
    let function_name = ctx.namer.resource("lambda-dbinit");

    let mut environment = BTreeMap::new();
    environment.insert("DB_HOST".to_string(), endpoint.clone());
    environment.insert("DB_USER".to_string(), ValueRef::literal(rds.admin_user.clone()));
    environment.insert("DB_NAME".to_string(), ValueRef::literal(rds.database_name.clone()));
    environment.insert("APP_USER".to_string(), ValueRef::literal(rds.app_user.clone()));
    environment.insert(
        "DB_SECRET_ARN".to_string(),
        ValueRef::attribute(credentials_secret, "arn"),
    );

    vec![
        Resource::DbInitFunction(DbInitFunctionSpec {
            name: function_name.clone(),
            runtime: "python3.12".to_string(),
            handler: "index.handler".to_string(),
            vpc: network.vpc.clone(),
            subnet_group: network.private_subnet_group.clone(),
            timeout_seconds: 30,
            environment,
            policy_statements: vec![PolicyStatement {
                actions: vec![
                    "rds-db:connect".to_string(),
                    "rds:DescribeDBInstances".to_string(),
                    "rds:GenerateDbAuthToken".to_string(),
                ],
                resources: vec!["*".to_string()],
            }],
            read_secrets: vec![credentials_secret.to_string()],
        }),
        Resource::SecurityGroupIngress(SecurityGroupIngressSpec {
            security_group: db_security_group.to_string(),
            rule: IngressRule {
                source: IngressPeer::Resource {
                    resource: function_name.clone(),
                },
                protocol: "tcp".to_string(),
                from_port: Some(POSTGRES_PORT),
                to_port: Some(POSTGRES_PORT),
                description: "Allow DB init function to reach PostgreSQL".to_string(),
            },
        }),
        Resource::DbInitTrigger(DbInitTriggerSpec {
            name: ctx.namer.resource("dbinit"),
            function: function_name,
            invoke_on: vec![TriggerEvent::Create, TriggerEvent::Update],
        }),
    ]
}
