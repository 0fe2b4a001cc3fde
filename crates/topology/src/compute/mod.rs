//! Compute tier: observability primitives, the container service behind
//! the load balancer, edge controls, DNS, and the optional dashboard CDN.
//!
//! Depends on the network tier (placement) and the data tier (connection
//! endpoint, credential reference, perimeter ingress). It is never
//! declared before both are resolved.

pub mod dashboard;
pub mod ecs;
pub mod observability;

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::certificate::{CertificateRef, CertificateSpec, CertificateSource, TlsPolicy};
use crate::compose::TierContext;
use crate::data::DataOutputs;
use crate::dns::{record_name, sanitize_zone_name, DnsRecordSpec, RecordType};
use crate::error::{DomainContext, Warning};
use crate::image::ImageSource;
use crate::network::NetworkOutputs;
use crate::plan::{Resource, StackOutput, StackPlan, Tier};
use crate::resources::{
    BucketSpec, IngressPeer, IngressRule, PolicyStatement, RemovalPolicy, SecretRef,
    SecurityGroupIngressSpec, SecurityGroupSpec, ValueRef,
};

use dashboard::{DistributionOrigin, DistributionSpec, OriginAccessIdentitySpec};
use ecs::{
    AccessLogConfig, AutoscalingSpec, CircuitBreaker, ClusterSpec, ContainerImage, ContainerSpec,
    EcrRepositorySpec, GuardDutyDetectorSpec, ImageAssetSpec, ListenerAction, ListenerSpec,
    LoadBalancerSpec, LogConfig, ScalingPolicy, ServiceSpec, TargetGroupSpec, TaskDefinitionSpec,
    WafWebAclSpec,
};
use observability::{
    alb_5xx_alarm, service_cpu_alarm, service_memory_alarm, AlarmTopicSpec, LogGroupSpec,
    RetentionClass,
};

/// The declared compute stack plus the warnings it surfaced.
#[derive(Debug)]
pub struct ComputeTier {
    pub stack: StackPlan,
    pub warnings: Vec<Warning>,
}

/// Declares the compute tier.
///
/// `image_source` and `tls` are resolved (and validated) by the caller
/// before any tier is declared, so by the time this runs there is nothing
/// left that can fail, only warn.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn declare(
    ctx: &TierContext<'_>,
    network: &NetworkOutputs,
    data: &DataOutputs,
    image_source: &ImageSource,
    tls: &TlsPolicy,
) -> ComputeTier {
    let ecs_settings = &ctx.settings.ecs;
    let security = &ctx.globals.security;

    let mut resources = Vec::new();
    let mut outputs = Vec::new();
    let mut warnings = Vec::new();

    // Observability primitives come first so the container and the load
    // balancer can reference them.
    let log_group_name = format!(
        "{}/{}",
        security.log_group_prefix,
        ctx.namer.resource("service")
    );
    resources.push(Resource::LogGroup(LogGroupSpec {
        name: log_group_name.clone(),
        retention: RetentionClass::from_days(ctx.settings.observability.log_retention_days),
        kms_alias: security.kms_aliases.logs.clone(),
    }));

    let topic_name = ctx.namer.resource("sns-alarms");
    resources.push(Resource::AlarmTopic(AlarmTopicSpec {
        name: topic_name.clone(),
        display_name: topic_name.clone(),
        email_subscriptions: ctx
            .settings
            .observability
            .alert_email
            .iter()
            .cloned()
            .collect(),
    }));

    let access_logs = declare_access_logs(ctx, &mut resources);

    // Image source resources and their outputs.
    let container_image = declare_image(ctx, image_source, &mut resources, &mut outputs);

    // ALB certificate, when the TLS policy requests a managed one.
    let alb_certificate = match tls {
        TlsPolicy::Enforced(CertificateSource::Existing { arn }) => {
            outputs.push(StackOutput {
                key: "AlbCertificateArn".to_string(),
                value: ValueRef::literal(arn.clone()),
                description: None,
            });
            Some(CertificateRef::Arn { arn: arn.clone() })
        }
        TlsPolicy::Enforced(CertificateSource::DnsValidated {
            domain,
            hosted_zone_id,
            zone_name,
        }) => {
            let certificate_name = ctx.namer.resource("cert");
            resources.push(Resource::Certificate(CertificateSpec {
                name: certificate_name.clone(),
                domain_name: domain.clone(),
                hosted_zone_id: hosted_zone_id.clone(),
                zone_name: zone_name.clone(),
                region: None,
            }));
            outputs.push(StackOutput {
                key: "AlbCertificateArn".to_string(),
                value: ValueRef::attribute(certificate_name.clone(), "arn"),
                description: None,
            });
            Some(CertificateRef::Resource {
                resource: certificate_name,
            })
        }
        TlsPolicy::Disabled => None,
    };

    // Cluster, service perimeter, task definition, service.
    let cluster_name = ctx.namer.resource("ecs-cluster");
    resources.push(Resource::EcsCluster(ClusterSpec {
        name: cluster_name.clone(),
        vpc: network.vpc.clone(),
    }));

    let service_security_group = ctx.namer.resource("sg-ecs");
    resources.push(Resource::SecurityGroup(SecurityGroupSpec {
        name: service_security_group.clone(),
        vpc: network.vpc.clone(),
        description: "Security group for ECS service tasks".to_string(),
        allow_all_outbound: true,
        ingress: vec![],
    }));

    let task_family = ctx.namer.resource("task");
    resources.push(Resource::TaskDefinition(task_definition(
        ctx,
        data,
        &task_family,
        container_image,
        &log_group_name,
    )));

    let service_name = ctx.namer.resource("service");
    let target_group_name = ctx.namer.resource("tg");
    resources.push(Resource::FargateService(ServiceSpec {
        name: service_name.clone(),
        cluster: cluster_name.clone(),
        task_definition: task_family,
        desired_count: ecs_settings.desired_count,
        assign_public_ip: ecs_settings.assign_public_ip,
        security_groups: vec![service_security_group.clone()],
        circuit_breaker: CircuitBreaker {
            enable: true,
            rollback: true,
        },
        autoscaling: autoscaling(ctx, &target_group_name),
    }));

    // Load balancer and listener wiring.
    let alb_name = ctx.namer.resource("alb");
    resources.push(Resource::LoadBalancer(LoadBalancerSpec {
        name: alb_name.clone(),
        vpc: network.vpc.clone(),
        internet_facing: true,
        access_logs,
        listeners: listeners(alb_certificate, &target_group_name),
        target_group: TargetGroupSpec {
            name: target_group_name,
            port: ecs_settings.container_port,
            targets: service_name.clone(),
            health_check_path: "/healthz".to_string(),
        },
    }));

    // Perimeter ingress: ALB to the tasks, tasks to the database.
    resources.push(Resource::SecurityGroupIngress(SecurityGroupIngressSpec {
        security_group: service_security_group.clone(),
        rule: IngressRule {
            source: IngressPeer::Resource {
                resource: alb_name.clone(),
            },
            protocol: "tcp".to_string(),
            from_port: Some(ecs_settings.container_port),
            to_port: Some(ecs_settings.container_port),
            description: "Allow ALB to reach service tasks".to_string(),
        },
    }));
    resources.push(Resource::SecurityGroupIngress(SecurityGroupIngressSpec {
        security_group: data.security_group.clone(),
        rule: IngressRule {
            source: IngressPeer::Resource {
                resource: service_security_group,
            },
            protocol: "tcp".to_string(),
            from_port: Some(data.port),
            to_port: Some(data.port),
            description: "Allow ECS tasks to reach PostgreSQL".to_string(),
        },
    }));

    // Alarms routed to the topic.
    resources.push(Resource::Alarm(service_cpu_alarm(
        &cluster_name,
        &service_name,
        &topic_name,
    )));
    resources.push(Resource::Alarm(service_memory_alarm(
        &cluster_name,
        &service_name,
        &topic_name,
    )));
    resources.push(Resource::Alarm(alb_5xx_alarm(&alb_name, &topic_name)));

    declare_app_dns(ctx, &alb_name, &mut resources, &mut outputs, &mut warnings);

    // Edge controls, both off by default.
    if security.enable_guard_duty {
        resources.push(Resource::GuardDutyDetector(GuardDutyDetectorSpec {
            name: ctx.namer.resource("guardduty"),
            enable: true,
        }));
    }
    if security.enable_waf {
        resources.push(Resource::WafWebAcl(WafWebAclSpec {
            name: ctx.namer.resource("acl"),
            metric_name: ctx.namer.resource("waf"),
            scope: "REGIONAL".to_string(),
            default_action: "allow".to_string(),
            cloudwatch_metrics_enabled: true,
            sampled_requests_enabled: true,
            associate_with: alb_name.clone(),
        }));
    }

    if ctx.settings.dashboard.as_ref().is_some_and(|d| d.enabled) {
        declare_dashboard(ctx, &mut resources, &mut outputs, &mut warnings);
    }

    outputs.push(StackOutput {
        key: "AlbDnsName".to_string(),
        value: ValueRef::attribute(alb_name, "dns_name"),
        description: None,
    });
    outputs.push(StackOutput {
        key: "RdsEndpoint".to_string(),
        value: data.endpoint.clone(),
        description: None,
    });

    info!(
        environment = ctx.env_name,
        service = %service_name,
        warnings = warnings.len(),
        "declared compute tier"
    );

    ComputeTier {
        stack: StackPlan {
            id: format!("app-{}", ctx.env_name),
            tier: Tier::Compute,
            environment: ctx.env_name.to_string(),
            tags: ctx.tags.clone(),
            depends_on: vec![
                format!("network-{}", ctx.env_name),
                format!("data-{}", ctx.env_name),
            ],
            resources,
            outputs,
        },
        warnings,
    }
}

fn declare_access_logs(
    ctx: &TierContext<'_>,
    resources: &mut Vec<Resource>,
) -> Option<AccessLogConfig> {
    let access_logs = ctx.settings.observability.alb_access_logs.as_ref()?;
    if !access_logs.enabled {
        return None;
    }

    let bucket_name = ctx.namer.resource("alb-logs");
    resources.push(Resource::Bucket(BucketSpec {
        name: bucket_name.clone(),
        bucket_name: None,
        encryption: "s3_managed".to_string(),
        block_public_access: true,
        enforce_tls: true,
        versioned: false,
        expiration_days: access_logs.expiration_days,
        removal_policy: RemovalPolicy::Destroy,
        auto_delete_objects: true,
    }));

    Some(AccessLogConfig {
        bucket: bucket_name,
        prefix: access_logs
            .prefix
            .clone()
            .unwrap_or_else(|| ctx.namer.resource("alb")),
    })
}

fn declare_image(
    ctx: &TierContext<'_>,
    image_source: &ImageSource,
    resources: &mut Vec<Resource>,
    outputs: &mut Vec<StackOutput>,
) -> ContainerImage {
    match image_source {
        ImageSource::BuildOnDeploy { context_directory } => {
            let asset_name = ctx.namer.resource("app-image");
            resources.push(Resource::ImageAsset(ImageAssetSpec {
                name: asset_name.clone(),
                context_directory: context_directory.clone(),
            }));
            outputs.push(StackOutput {
                key: "DevImageAssetUri".to_string(),
                value: ValueRef::attribute(asset_name.clone(), "image_uri"),
                description: None,
            });
            ContainerImage::Asset { asset: asset_name }
        }
        ImageSource::Registry {
            repository,
            managed,
            tag,
        } => {
            if *managed {
                resources.push(Resource::EcrRepository(EcrRepositorySpec {
                    name: repository.clone(),
                    image_scan_on_push: true,
                    removal_policy: RemovalPolicy::Retain,
                    max_image_count: 10,
                }));
            }
            outputs.push(StackOutput {
                key: "EcrRepositoryUri".to_string(),
                value: ValueRef::attribute(repository.clone(), "repository_uri"),
                description: None,
            });
            outputs.push(StackOutput {
                key: "AppImageTag".to_string(),
                value: ValueRef::literal(tag.clone()),
                description: None,
            });
            ContainerImage::Registry {
                repository: repository.clone(),
                tag: tag.clone(),
            }
        }
    }
}

fn task_definition(
    ctx: &TierContext<'_>,
    data: &DataOutputs,
    family: &str,
    image: ContainerImage,
    log_group: &str,
) -> TaskDefinitionSpec {
    let ecs_settings = &ctx.settings.ecs;

    let mut environment = BTreeMap::new();
    environment.insert("ENVIRONMENT".to_string(), ValueRef::literal(ctx.env_name));
    environment.insert("AWS_REGION".to_string(), ValueRef::literal(ctx.region));
    environment.insert(
        "DB_NAME".to_string(),
        ValueRef::literal(data.database_name.clone()),
    );
    environment.insert(
        "DB_USER".to_string(),
        ValueRef::literal(data.admin_user.clone()),
    );
    environment.insert("DB_HOST".to_string(), data.endpoint.clone());

    let mut secrets = BTreeMap::new();
    secrets.insert(
        "DB_PASSWORD".to_string(),
        SecretRef {
            secret: data.credentials_secret.clone(),
            json_field: "password".to_string(),
        },
    );

    let pull_from = match &image {
        ContainerImage::Registry { repository, .. } => Some(repository.clone()),
        ContainerImage::Asset { .. } => None,
    };

    TaskDefinitionSpec {
        family: family.to_string(),
        cpu: ecs_settings.cpu,
        memory_mib: ecs_settings.memory_mib,
        task_role_policies: vec![
            PolicyStatement {
                actions: vec!["rds-db:connect".to_string()],
                resources: vec![format!(
                    "arn:aws:rds-db:{}:*:dbuser:*/{}",
                    ctx.region, data.admin_user
                )],
            },
            PolicyStatement {
                actions: vec!["rds:GenerateDbAuthToken".to_string()],
                resources: vec!["*".to_string()],
            },
        ],
        pull_from,
        container: ContainerSpec {
            name: ctx.namer.resource("container"),
            image,
            port_mappings: vec![ecs_settings.container_port],
            log: LogConfig {
                log_group: log_group.to_string(),
                stream_prefix: ctx.namer.resource("stream"),
            },
            environment,
            secrets,
        },
    }
}

fn autoscaling(ctx: &TierContext<'_>, target_group: &str) -> AutoscalingSpec {
    let ecs_settings = &ctx.settings.ecs;
    let mut policies = vec![
        ScalingPolicy::CpuUtilization {
            target_utilization_percent: ecs_settings.scaling_target_utilization,
            scale_in_cooldown_seconds: 60,
            scale_out_cooldown_seconds: 60,
        },
        ScalingPolicy::MemoryUtilization {
            target_utilization_percent: ecs_settings.scaling_target_utilization,
            scale_in_cooldown_seconds: 120,
            scale_out_cooldown_seconds: 60,
        },
    ];

    if let Some(requests_per_target) = ecs_settings.requests_per_target {
        policies.push(ScalingPolicy::RequestCountPerTarget {
            requests_per_target,
            target_group: target_group.to_string(),
            scale_in_cooldown_seconds: 60,
            scale_out_cooldown_seconds: 30,
        });
    }

    AutoscalingSpec {
        min_capacity: ecs_settings.min_capacity,
        max_capacity: ecs_settings.max_capacity,
        policies,
    }
}

fn listeners(certificate: Option<CertificateRef>, target_group: &str) -> Vec<ListenerSpec> {
    match certificate {
        Some(certificate) => vec![
            ListenerSpec {
                port: 443,
                protocol: "HTTPS".to_string(),
                certificate: Some(certificate),
                open: true,
                action: ListenerAction::Forward {
                    target_group: target_group.to_string(),
                },
            },
            ListenerSpec {
                port: 80,
                protocol: "HTTP".to_string(),
                certificate: None,
                open: true,
                action: ListenerAction::RedirectToHttps { port: 443 },
            },
        ],
        None => vec![ListenerSpec {
            port: 80,
            protocol: "HTTP".to_string(),
            certificate: None,
            open: true,
            action: ListenerAction::Forward {
                target_group: target_group.to_string(),
            },
        }],
    }
}

fn declare_app_dns(
    ctx: &TierContext<'_>,
    alb_name: &str,
    resources: &mut Vec<Resource>,
    outputs: &mut Vec<StackOutput>,
    warnings: &mut Vec<Warning>,
) {
    let ecs_settings = &ctx.settings.ecs;
    let Some(domain) = ecs_settings.domain_name.as_deref().map(sanitize_zone_name) else {
        return;
    };

    let zone = ecs_settings.hosted_zone_id.as_deref().zip(
        ecs_settings
            .hosted_zone_name
            .as_deref()
            .map(sanitize_zone_name),
    );

    match zone {
        Some((zone_id, zone_name)) => {
            let name = record_name(domain, zone_name);
            for record_type in [RecordType::A, RecordType::Aaaa] {
                resources.push(Resource::DnsRecord(DnsRecordSpec {
                    record_name: name.clone(),
                    hosted_zone_id: zone_id.to_string(),
                    zone_name: zone_name.to_string(),
                    record_type,
                    alias_target: alb_name.to_string(),
                }));
            }
            outputs.push(StackOutput {
                key: "AlbCustomDomain".to_string(),
                value: ValueRef::literal(domain),
                description: None,
            });
        }
        None => {
            warn!(domain, "application domain has no hosted zone information");
            warnings.push(Warning::DomainWithoutZone {
                domain: domain.to_string(),
                context: DomainContext::AlbAlias,
            });
        }
    }
}

fn declare_dashboard(
    ctx: &TierContext<'_>,
    resources: &mut Vec<Resource>,
    outputs: &mut Vec<StackOutput>,
    warnings: &mut Vec<Warning>,
) {
    let Some(settings) = ctx.settings.dashboard.as_ref() else {
        return;
    };

    let bucket_name = ctx.namer.resource("dashboard");
    resources.push(Resource::Bucket(BucketSpec {
        name: bucket_name.clone(),
        bucket_name: settings.bucket_name.clone(),
        encryption: "s3_managed".to_string(),
        block_public_access: true,
        enforce_tls: true,
        versioned: false,
        expiration_days: None,
        removal_policy: RemovalPolicy::Retain,
        auto_delete_objects: false,
    }));

    let identity_name = ctx.namer.resource("oai");
    resources.push(Resource::OriginAccessIdentity(OriginAccessIdentitySpec {
        name: identity_name.clone(),
        reads_bucket: bucket_name.clone(),
    }));

    let domain = settings.domain_name.as_deref().map(sanitize_zone_name);
    let zone = settings.hosted_zone_id.as_deref().zip(
        settings
            .hosted_zone_name
            .as_deref()
            .map(sanitize_zone_name),
    );

    let certificate = match (domain, &settings.certificate_arn, zone) {
        (Some(_), Some(arn), _) => Some(CertificateRef::Arn { arn: arn.clone() }),
        (Some(domain), None, Some((zone_id, zone_name))) => {
            let certificate_name = ctx.namer.resource("cert-dashboard");
            resources.push(Resource::Certificate(CertificateSpec {
                name: certificate_name.clone(),
                domain_name: domain.to_string(),
                hosted_zone_id: zone_id.to_string(),
                zone_name: zone_name.to_string(),
                // CDN certificates must live in us-east-1 regardless of the
                // stack region.
                region: Some("us-east-1".to_string()),
            }));
            Some(CertificateRef::Resource {
                resource: certificate_name,
            })
        }
        (Some(domain), None, None) => {
            warnings.push(Warning::DomainWithoutZone {
                domain: domain.to_string(),
                context: DomainContext::DashboardCustomDomain,
            });
            None
        }
        (None, _, _) => None,
    };

    let has_custom_domain = certificate.is_some() && domain.is_some();

    let distribution_name = ctx.namer.resource("cdn");
    resources.push(Resource::Distribution(DistributionSpec {
        name: distribution_name.clone(),
        default_root_object: "index.html".to_string(),
        minimum_protocol_version: "TLSv1.2_2021".to_string(),
        origin: DistributionOrigin {
            bucket: bucket_name.clone(),
            origin_access_identity: identity_name,
        },
        viewer_protocol_policy: "redirect_to_https".to_string(),
        allowed_methods: "GET_HEAD_OPTIONS".to_string(),
        cache_policy: "caching_optimized".to_string(),
        domain_names: if has_custom_domain {
            domain.iter().map(ToString::to_string).collect()
        } else {
            vec![]
        },
        certificate,
    }));

    match (has_custom_domain, domain, zone) {
        (true, Some(domain), Some((zone_id, zone_name))) => {
            resources.push(Resource::DnsRecord(DnsRecordSpec {
                record_name: Some(domain.to_string()),
                hosted_zone_id: zone_id.to_string(),
                zone_name: zone_name.to_string(),
                record_type: RecordType::A,
                alias_target: distribution_name.clone(),
            }));
        }
        (_, Some(domain), _) if !has_custom_domain || zone.is_none() => {
            warnings.push(Warning::DomainWithoutZone {
                domain: domain.to_string(),
                context: DomainContext::DashboardAlias,
            });
        }
        _ => {}
    }

    outputs.push(StackOutput {
        key: "DashboardBucketName".to_string(),
        value: ValueRef::attribute(bucket_name, "bucket_name"),
        description: None,
    });
    outputs.push(StackOutput {
        key: "DashboardDistributionId".to_string(),
        value: ValueRef::attribute(distribution_name.clone(), "distribution_id"),
        description: None,
    });
    outputs.push(StackOutput {
        key: "DashboardDistributionDomainName".to_string(),
        value: ValueRef::attribute(distribution_name, "domain_name"),
        description: None,
    });
}
