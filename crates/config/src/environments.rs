//! Environment registry: the per-environment settings bundles and their
//! resolution from an optional selector string.
//!
//! The registry is an explicitly constructed, immutable value. Callers build
//! it once at startup ([`EnvironmentRegistry::builtin`]) and pass it to
//! whatever needs resolution; there is no module-level mutable state, so
//! tests can substitute alternate registries freely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::globals::TagOverrides;

/// Network tier settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VpcSettings {
    /// VPC address space.
    pub cidr: String,

    /// Availability zones to span. Empty or absent falls back to the first
    /// two zones of the resolved region.
    #[serde(default)]
    pub availability_zones: Vec<String>,

    /// Managed NAT gateway count (ignored when `use_nat_instance` is set).
    pub nat_gateway_count: u32,

    /// Route private-subnet egress through a self-managed NAT instance
    /// instead of managed gateways.
    pub use_nat_instance: bool,
}

/// Self-managed NAT instance settings (development environments).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NatInstanceSettings {
    /// EC2 instance type, e.g. `t3.micro`.
    pub instance_type: String,

    /// CIDR blocks granted temporary SSH access. Session Manager is the
    /// expected access path; this list is normally empty.
    #[serde(default)]
    pub allow_ssh_from: Vec<String>,
}

/// Data tier settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RdsSettings {
    /// Database instance type, e.g. `t3.micro`.
    pub instance_type: String,

    /// Allocated storage in GiB.
    pub allocated_storage_gib: u32,

    /// Provision a standby in a second availability zone.
    pub multi_az: bool,

    /// Initial database name.
    pub database_name: String,

    /// Admin login; credentials are generated into a secret.
    pub admin_user: String,

    /// Application login created by the one-shot init routine.
    pub app_user: String,

    /// Automated backup retention window in days.
    pub backup_retention_days: u32,

    /// Declare a read replica alongside the primary.
    pub enable_replica: bool,
}

/// Compute tier settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EcsSettings {
    /// Build the container image from the application source at deploy time
    /// instead of pulling a prebuilt image from a registry.
    pub build_on_deploy: bool,

    /// Task CPU units (1024 = 1 vCPU).
    pub cpu: u32,

    /// Task memory in MiB.
    pub memory_mib: u32,

    /// Steady-state task count.
    pub desired_count: u32,

    /// Registry repository holding the prebuilt image. Required when
    /// `build_on_deploy` is false.
    pub repository_name: Option<String>,

    /// Declare the repository as part of the topology rather than
    /// referencing one that already exists.
    #[serde(default)]
    pub manage_repository: bool,

    /// Default image tag; an invocation-level override wins.
    pub image_tag: String,

    /// Container listen port.
    pub container_port: u16,

    /// Give tasks public IPs (only sensible without NAT egress).
    pub assign_public_ip: bool,

    /// Autoscaling lower bound.
    pub min_capacity: u32,

    /// Autoscaling upper bound.
    pub max_capacity: u32,

    /// CPU/memory target-tracking utilization percentage.
    pub scaling_target_utilization: u32,

    /// Request-count scaling target per load-balancer target.
    pub requests_per_target: Option<u32>,

    /// Pre-issued TLS certificate for the load balancer listener.
    pub certificate_arn: Option<String>,

    /// Public domain name routed to the load balancer.
    pub domain_name: Option<String>,

    /// Hosted zone id holding `domain_name`.
    pub hosted_zone_id: Option<String>,

    /// Hosted zone name holding `domain_name`.
    pub hosted_zone_name: Option<String>,
}

/// Load-balancer access log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbAccessLogSettings {
    pub enabled: bool,

    /// Object key prefix inside the access-log bucket.
    pub prefix: Option<String>,

    /// Days before access-log objects expire.
    pub expiration_days: Option<u32>,
}

/// Observability settings: logs, alerting, access logs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilitySettings {
    /// Destination for alarm notifications.
    pub alert_email: Option<String>,

    /// Application log retention in days (mapped to the closest supported
    /// retention class at composition time).
    pub log_retention_days: u32,

    /// Load-balancer access logging; absent disables it.
    pub alb_access_logs: Option<AlbAccessLogSettings>,
}

/// Static-dashboard delivery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardSettings {
    pub enabled: bool,
    pub domain_name: Option<String>,
    pub hosted_zone_id: Option<String>,
    pub hosted_zone_name: Option<String>,
    pub certificate_arn: Option<String>,

    /// Explicit bucket name; absent lets the provisioning engine pick one.
    pub bucket_name: Option<String>,
}

/// Complete settings bundle for one environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentSettings {
    /// Default deployment region; an invocation-level override wins.
    pub region: String,

    /// Service identifier used in canonical resource names.
    pub service: String,

    /// Client identifier used in canonical resource names.
    pub client: String,

    /// Confidentiality classification; absent falls back to the global tag
    /// default.
    pub confidentiality: Option<String>,

    pub vpc: VpcSettings,

    /// Present only when `vpc.use_nat_instance` is set.
    pub nat_instance: Option<NatInstanceSettings>,

    pub rds: RdsSettings,
    pub ecs: EcsSettings,
    pub observability: ObservabilitySettings,

    /// Absent means no dashboard tier for this environment.
    pub dashboard: Option<DashboardSettings>,

    /// Per-environment tag overrides, merged over the global defaults.
    pub tag_overrides: Option<TagOverrides>,
}

/// Outcome of a successful environment resolution.
#[derive(Debug, Clone)]
pub struct ResolvedEnvironment {
    /// Canonical (lowercase) environment name.
    pub name: String,

    /// Full settings bundle for the environment.
    pub settings: EnvironmentSettings,
}

/// Immutable mapping from environment name to settings bundle.
///
/// Exactly one settings record exists per known environment name. Iteration
/// and the error message's supported-name list are in stable sorted order.
#[derive(Debug, Clone)]
pub struct EnvironmentRegistry {
    environments: BTreeMap<String, EnvironmentSettings>,
}

/// Environment assumed when the selector is absent.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

impl EnvironmentRegistry {
    /// Builds a registry from an explicit mapping. Primarily for tests;
    /// production callers use [`EnvironmentRegistry::builtin`].
    #[must_use]
    pub fn new(environments: BTreeMap<String, EnvironmentSettings>) -> Self {
        Self { environments }
    }

    /// The supported environment names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Iterates over `(name, settings)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnvironmentSettings)> {
        self.environments
            .iter()
            .map(|(name, settings)| (name.as_str(), settings))
    }

    /// Resolves an optional, case-insensitive selector to a canonical
    /// environment name and its settings bundle.
    ///
    /// An absent selector resolves to [`DEFAULT_ENVIRONMENT`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownEnvironment`] when the normalized selector is
    /// not a registry key. The composition must abort entirely in that case;
    /// no partial topology may be produced.
    pub fn resolve(&self, raw: Option<&str>) -> Result<ResolvedEnvironment, ConfigError> {
        let requested = raw.unwrap_or_else(|| {
            tracing::debug!("no environment selector supplied, assuming {DEFAULT_ENVIRONMENT}");
            DEFAULT_ENVIRONMENT
        });
        let normalized = requested.to_lowercase();

        match self.environments.get(&normalized) {
            Some(settings) => Ok(ResolvedEnvironment {
                name: normalized,
                settings: settings.clone(),
            }),
            None => Err(ConfigError::UnknownEnvironment {
                requested: requested.to_string(),
                supported: self.names().collect::<Vec<_>>().join(", "),
            }),
        }
    }

    /// The built-in registry: `dev`, `hml`, and `prd`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert("dev".to_string(), dev_settings());
        environments.insert("hml".to_string(), hml_settings());
        environments.insert("prd".to_string(), prd_settings());
        Self { environments }
    }
}

fn dev_settings() -> EnvironmentSettings {
    EnvironmentSettings {
        region: "us-east-1".to_string(),
        service: "djg".to_string(),
        client: "ander".to_string(),
        confidentiality: Some("internal".to_string()),
        vpc: VpcSettings {
            cidr: "10.10.0.0/16".to_string(),
            availability_zones: vec!["us-east-1a".to_string(), "us-east-1b".to_string()],
            nat_gateway_count: 1,
            use_nat_instance: true,
        },
        nat_instance: Some(NatInstanceSettings {
            instance_type: "t3.micro".to_string(),
            allow_ssh_from: vec![],
        }),
        rds: RdsSettings {
            instance_type: "t3.micro".to_string(),
            allocated_storage_gib: 20,
            multi_az: false,
            database_name: "appdb".to_string(),
            admin_user: "postgres".to_string(),
            app_user: "app_user".to_string(),
            backup_retention_days: 7,
            enable_replica: false,
        },
        ecs: EcsSettings {
            build_on_deploy: true,
            cpu: 256,
            memory_mib: 512,
            desired_count: 1,
            repository_name: None,
            manage_repository: false,
            image_tag: "latest".to_string(),
            container_port: 8000,
            assign_public_ip: true,
            min_capacity: 1,
            max_capacity: 5,
            scaling_target_utilization: 60,
            requests_per_target: Some(200),
            certificate_arn: None,
            domain_name: Some("app.dev.mr-devops.shop".to_string()),
            hosted_zone_id: Some("Z00289329CPNW6FKNRXR".to_string()),
            hosted_zone_name: Some("mr-devops.shop".to_string()),
        },
        observability: ObservabilitySettings {
            alert_email: Some("alerts-dev@example.com".to_string()),
            log_retention_days: 7,
            alb_access_logs: Some(AlbAccessLogSettings {
                enabled: true,
                prefix: Some("dev".to_string()),
                expiration_days: Some(30),
            }),
        },
        dashboard: Some(DashboardSettings {
            enabled: true,
            domain_name: Some("dashboard.dev.mr-devops.shop".to_string()),
            hosted_zone_id: Some("Z00289329CPNW6FKNRXR".to_string()),
            hosted_zone_name: Some("mr-devops.shop".to_string()),
            certificate_arn: None,
            bucket_name: None,
        }),
        tag_overrides: None,
    }
}

fn hml_settings() -> EnvironmentSettings {
    EnvironmentSettings {
        region: "us-east-1".to_string(),
        service: "django".to_string(),
        client: "and".to_string(),
        confidentiality: Some("restricted".to_string()),
        vpc: VpcSettings {
            cidr: "10.20.0.0/16".to_string(),
            availability_zones: vec!["us-east-1a".to_string(), "us-east-1b".to_string()],
            nat_gateway_count: 1,
            use_nat_instance: false,
        },
        nat_instance: None,
        rds: RdsSettings {
            instance_type: "t3.micro".to_string(),
            allocated_storage_gib: 50,
            multi_az: true,
            database_name: "appdb".to_string(),
            admin_user: "postgres".to_string(),
            app_user: "app_user".to_string(),
            backup_retention_days: 14,
            enable_replica: false,
        },
        ecs: EcsSettings {
            build_on_deploy: false,
            cpu: 512,
            memory_mib: 1024,
            desired_count: 2,
            repository_name: Some("django-app".to_string()),
            manage_repository: true,
            image_tag: "latest".to_string(),
            container_port: 8000,
            assign_public_ip: false,
            min_capacity: 1,
            max_capacity: 6,
            scaling_target_utilization: 60,
            requests_per_target: Some(800),
            certificate_arn: None,
            domain_name: None,
            hosted_zone_id: None,
            hosted_zone_name: None,
        },
        observability: ObservabilitySettings {
            alert_email: Some("alerts-hml@example.com".to_string()),
            log_retention_days: 14,
            alb_access_logs: Some(AlbAccessLogSettings {
                enabled: true,
                prefix: Some("hml".to_string()),
                expiration_days: Some(45),
            }),
        },
        dashboard: Some(DashboardSettings {
            enabled: false,
            domain_name: None,
            hosted_zone_id: None,
            hosted_zone_name: None,
            certificate_arn: None,
            bucket_name: None,
        }),
        tag_overrides: None,
    }
}

fn prd_settings() -> EnvironmentSettings {
    EnvironmentSettings {
        region: "us-east-1".to_string(),
        service: "django".to_string(),
        client: "and".to_string(),
        confidentiality: Some("confidential".to_string()),
        vpc: VpcSettings {
            cidr: "10.30.0.0/16".to_string(),
            availability_zones: vec![
                "us-east-1a".to_string(),
                "us-east-1b".to_string(),
                "us-east-1c".to_string(),
            ],
            nat_gateway_count: 3,
            use_nat_instance: false,
        },
        nat_instance: None,
        rds: RdsSettings {
            instance_type: "t3.micro".to_string(),
            allocated_storage_gib: 100,
            multi_az: true,
            database_name: "appdb".to_string(),
            admin_user: "postgres".to_string(),
            app_user: "app_user".to_string(),
            backup_retention_days: 35,
            enable_replica: true,
        },
        ecs: EcsSettings {
            build_on_deploy: false,
            cpu: 512,
            memory_mib: 1024,
            desired_count: 3,
            repository_name: Some("django-app".to_string()),
            manage_repository: false,
            image_tag: "latest".to_string(),
            container_port: 8000,
            assign_public_ip: false,
            min_capacity: 2,
            max_capacity: 8,
            scaling_target_utilization: 55,
            requests_per_target: Some(1200),
            certificate_arn: None,
            domain_name: None,
            hosted_zone_id: None,
            hosted_zone_name: None,
        },
        observability: ObservabilitySettings {
            alert_email: Some("alerts-prod@example.com".to_string()),
            log_retention_days: 30,
            alb_access_logs: Some(AlbAccessLogSettings {
                enabled: true,
                prefix: Some("prd".to_string()),
                expiration_days: Some(90),
            }),
        },
        dashboard: Some(DashboardSettings {
            enabled: false,
            domain_name: None,
            hosted_zone_id: None,
            hosted_zone_name: None,
            certificate_arn: None,
            bucket_name: None,
        }),
        tag_overrides: Some(TagOverrides {
            confidentiality: Some("secret".to_string()),
            ..TagOverrides::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = EnvironmentRegistry::builtin();
        let upper = registry.resolve(Some("PRD")).unwrap();
        let lower = registry.resolve(Some("prd")).unwrap();

        assert_eq!(upper.name, "prd");
        assert_eq!(upper.name, lower.name);
        assert_eq!(upper.settings.vpc.cidr, lower.settings.vpc.cidr);
        assert_eq!(upper.settings.rds.backup_retention_days, 35);
    }

    #[test]
    fn resolve_defaults_to_dev() {
        let registry = EnvironmentRegistry::builtin();
        let resolved = registry.resolve(None).unwrap();
        assert_eq!(resolved.name, "dev");
        assert_eq!(resolved.settings.service, "djg");
        assert_eq!(resolved.settings.client, "ander");
    }

    #[test]
    fn resolve_unknown_lists_supported_names() {
        let registry = EnvironmentRegistry::builtin();
        let err = registry.resolve(Some("bogus")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown environment \"bogus\". Supported environments: dev, hml, prd."
        );
    }

    #[test]
    fn resolve_preserves_raw_selector_in_error() {
        let registry = EnvironmentRegistry::builtin();
        let err = registry.resolve(Some("Staging")).unwrap_err();
        assert!(err.to_string().contains("\"Staging\""));
    }

    #[test]
    fn alternate_registries_resolve_without_global_state() {
        let mut environments = BTreeMap::new();
        environments.insert("sandbox".to_string(), dev_settings());
        let registry = EnvironmentRegistry::new(environments);

        assert!(registry.resolve(Some("sandbox")).is_ok());
        let err = registry.resolve(Some("dev")).unwrap_err();
        assert!(err.to_string().contains("sandbox"));
    }

    #[test]
    fn registry_has_one_record_per_environment() {
        let registry = EnvironmentRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["dev", "hml", "prd"]);
    }

    #[test]
    fn nat_instance_settings_follow_the_egress_strategy() {
        let registry = EnvironmentRegistry::builtin();
        for (name, settings) in registry.iter() {
            assert_eq!(
                settings.vpc.use_nat_instance,
                settings.nat_instance.is_some(),
                "environment {name} mixes NAT strategies"
            );
        }
    }
}
