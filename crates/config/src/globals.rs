//! Global defaults shared by every environment: tag values and the security
//! baseline applied across all tiers.

use serde::{Deserialize, Serialize};

/// Default tag values applied to every deployable unit.
///
/// Individual environments may override any subset of these via
/// [`TagOverrides`]; see `tags::resolve_tags` for the merge semantics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlobalTagValues {
    /// Project identifier (the `Project` tag).
    pub project: String,

    /// Owning team (the `Owner` tag).
    pub owner: String,

    /// Tool that manages the resources (the `ManagedBy` tag).
    pub managed_by: String,

    /// Data confidentiality classification (the `Confidentiality` tag).
    pub confidentiality: String,
}

/// Partial override of [`GlobalTagValues`].
///
/// Keys left as `None` retain the global default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagOverrides {
    pub project: Option<String>,
    pub owner: Option<String>,
    pub managed_by: Option<String>,
    pub confidentiality: Option<String>,
}

/// KMS key aliases used when encrypting logs and storage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KmsAliases {
    /// Alias for log-group encryption.
    pub logs: Option<String>,

    /// Alias for database storage encryption.
    pub rds: Option<String>,

    /// Alias for anything not covered by a dedicated key.
    pub general: Option<String>,
}

/// Security baseline applied independently of environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityDefaults {
    /// Encrypt storage at rest wherever the tier supports it.
    pub enforce_encryption_at_rest: bool,

    /// Force TLS termination at the load balancer even when no certificate
    /// is configured (composition fails in that combination).
    pub enforce_tls: bool,

    /// Declare a GuardDuty detector in the compute tier.
    pub enable_guard_duty: bool,

    /// Declare a regional WAF web ACL attached to the load balancer.
    pub enable_waf: bool,

    /// Prefix for every log group name.
    pub log_group_prefix: String,

    /// Optional KMS aliases; absence means provider-managed keys.
    #[serde(default)]
    pub kms_aliases: KmsAliases,
}

/// Global configuration bundle: tag defaults plus the security baseline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalsConfig {
    pub tags: GlobalTagValues,
    pub security: SecurityDefaults,
}

impl GlobalsConfig {
    /// Built-in global defaults.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tags: GlobalTagValues {
                project: "django-ecs".to_string(),
                owner: "platform-team".to_string(),
                managed_by: "infra".to_string(),
                confidentiality: "internal".to_string(),
            },
            security: SecurityDefaults {
                enforce_encryption_at_rest: true,
                enforce_tls: false,
                enable_guard_duty: false,
                enable_waf: false,
                log_group_prefix: "/aws/django-ecs".to_string(),
                kms_aliases: KmsAliases {
                    logs: None,
                    rds: Some("alias/aws/rds".to_string()),
                    general: None,
                },
            },
        }
    }
}
