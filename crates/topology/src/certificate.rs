//! TLS certificate resolution and the listener TLS decision.
//!
//! Both fallback chains from the previous toolchain are expressed as
//! ordered strategy lists: each strategy either produces a definite outcome
//! or is not applicable, and the first applicable one wins.

use config::{EcsSettings, SecurityDefaults};
use serde::{Deserialize, Serialize};

use crate::dns::sanitize_zone_name;
use crate::error::ComposeError;

/// How the load balancer (or CDN) obtains its certificate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CertificateSource {
    /// A pre-issued certificate referenced by ARN.
    Existing { arn: String },

    /// A DNS-validated certificate requested against the hosted zone.
    DnsValidated {
        domain: String,
        hosted_zone_id: String,
        zone_name: String,
    },
}

/// Resolves the load balancer certificate.
///
/// Strategy order: explicit `certificate_arn`, then a DNS-validated request
/// (applicable only with both a domain and full hosted-zone information),
/// then none.
#[must_use]
pub fn resolve_alb_certificate(ecs: &EcsSettings) -> Option<CertificateSource> {
    if let Some(arn) = &ecs.certificate_arn {
        return Some(CertificateSource::Existing { arn: arn.clone() });
    }

    let domain = ecs.domain_name.as_deref().map(sanitize_zone_name)?;
    let zone_id = ecs.hosted_zone_id.as_deref()?;
    let zone_name = ecs.hosted_zone_name.as_deref().map(sanitize_zone_name)?;

    Some(CertificateSource::DnsValidated {
        domain: domain.to_string(),
        hosted_zone_id: zone_id.to_string(),
        zone_name: zone_name.to_string(),
    })
}

/// A DNS-validated certificate declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CertificateSpec {
    /// Canonical name.
    pub name: String,

    pub domain_name: String,
    pub hosted_zone_id: String,
    pub zone_name: String,

    /// Region the certificate is issued in; absent means the stack region.
    /// CDN certificates must be issued in us-east-1.
    pub region: Option<String>,
}

/// How a listener or distribution references its certificate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "certificate", rename_all = "snake_case")]
pub enum CertificateRef {
    /// Pre-issued, referenced by ARN.
    Arn { arn: String },

    /// Declared in this plan, referenced by canonical name.
    Resource { resource: String },
}

/// Listener TLS policy for the compute tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsPolicy {
    /// HTTPS listener terminates TLS; HTTP redirects permanently.
    Enforced(CertificateSource),

    /// Plain HTTP listener only.
    Disabled,
}

/// Decides the listener TLS policy.
///
/// TLS is enforced when the security baseline demands it OR a certificate
/// resolved. Certificate presence opting the listener into TLS is policy
/// carried over from the previous toolchain; changing it means gating
/// purely on `enforce_tls`.
///
/// # Errors
///
/// [`ComposeError::MissingRequiredSetting`] when enforcement is demanded
/// but no certificate is available for the HTTPS listener.
pub fn tls_decision(
    security: &SecurityDefaults,
    certificate: Option<&CertificateSource>,
) -> Result<TlsPolicy, ComposeError> {
    match (security.enforce_tls, certificate) {
        (_, Some(certificate)) => Ok(TlsPolicy::Enforced(certificate.clone())),
        (true, None) => Err(ComposeError::MissingRequiredSetting {
            setting: "ecs.certificate_arn",
            reason: "TLS enforcement is enabled but no certificate is configured for the HTTPS listener"
                .to_string(),
        }),
        (false, None) => Ok(TlsPolicy::Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::KmsAliases;

    fn ecs(arn: Option<&str>, domain: Option<&str>, zone: bool) -> EcsSettings {
        EcsSettings {
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
            max_capacity: 2,
            scaling_target_utilization: 60,
            requests_per_target: None,
            certificate_arn: arn.map(ToString::to_string),
            domain_name: domain.map(ToString::to_string),
            hosted_zone_id: zone.then(|| "Z123".to_string()),
            hosted_zone_name: zone.then(|| "example.com".to_string()),
        }
    }

    fn security(enforce_tls: bool) -> SecurityDefaults {
        SecurityDefaults {
            enforce_encryption_at_rest: true,
            enforce_tls,
            enable_guard_duty: false,
            enable_waf: false,
            log_group_prefix: "/aws/test".to_string(),
            kms_aliases: KmsAliases::default(),
        }
    }

    #[test]
    fn explicit_arn_wins_over_dns_validation() {
        let source = resolve_alb_certificate(&ecs(
            Some("arn:aws:acm:us-east-1:123:certificate/abc"),
            Some("app.example.com"),
            true,
        ));
        assert_eq!(
            source,
            Some(CertificateSource::Existing {
                arn: "arn:aws:acm:us-east-1:123:certificate/abc".to_string()
            })
        );
    }

    #[test]
    fn domain_with_zone_requests_dns_validation() {
        let source = resolve_alb_certificate(&ecs(None, Some("app.example.com."), true));
        assert_eq!(
            source,
            Some(CertificateSource::DnsValidated {
                domain: "app.example.com".to_string(),
                hosted_zone_id: "Z123".to_string(),
                zone_name: "example.com".to_string(),
            })
        );
    }

    #[test]
    fn domain_without_zone_resolves_nothing() {
        assert_eq!(resolve_alb_certificate(&ecs(None, Some("app.example.com"), false)), None);
    }

    #[test]
    fn certificate_presence_opts_into_tls() {
        let certificate = CertificateSource::Existing {
            arn: "arn:aws:acm:us-east-1:123:certificate/abc".to_string(),
        };
        let policy = tls_decision(&security(false), Some(&certificate)).unwrap();
        assert_eq!(policy, TlsPolicy::Enforced(certificate));
    }

    #[test]
    fn enforcement_without_certificate_is_a_missing_setting() {
        let err = tls_decision(&security(true), None).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::MissingRequiredSetting {
                setting: "ecs.certificate_arn",
                ..
            }
        ));
    }

    #[test]
    fn no_enforcement_and_no_certificate_disables_tls() {
        assert_eq!(tls_decision(&security(false), None).unwrap(), TlsPolicy::Disabled);
    }
}
