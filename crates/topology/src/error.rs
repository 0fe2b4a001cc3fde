//! Composition errors and warning-class conditions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal composition errors.
///
/// All of these are raised before any resource of the affected tier is
/// declared; a failed composition never yields a partial topology.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A setting requires a companion field that is absent from the
    /// environment configuration.
    #[error("Missing required setting `{setting}`: {reason}")]
    MissingRequiredSetting {
        /// Dotted path of the absent setting, e.g. `ecs.repository_name`.
        setting: &'static str,
        /// Why the setting is required in this configuration.
        reason: String,
    },

    /// A stack declares a dependency on a stack id that is not part of the
    /// plan.
    #[error("Stack `{stack}` depends on unknown stack `{dependency}`")]
    UnknownDependency { stack: String, dependency: String },

    /// The declared dependencies contain a cycle.
    #[error("Dependency cycle detected involving stack `{stack}`")]
    DependencyCycle { stack: String },
}

/// Which declaration site produced a domain warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainContext {
    /// Application domain on the load balancer.
    AlbAlias,
    /// Dashboard custom domain on the CDN distribution.
    DashboardCustomDomain,
    /// Dashboard alias record.
    DashboardAlias,
}

/// Non-fatal conditions surfaced alongside a successful composition.
///
/// Warnings never alter the exit outcome; they exist so a domain intent is
/// neither silently dropped nor allowed to fail the whole composition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// A domain name was configured without enough hosted-zone information
    /// to create a routing record.
    DomainWithoutZone {
        domain: String,
        context: DomainContext,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DomainWithoutZone { domain, context } => match context {
                DomainContext::AlbAlias => write!(
                    f,
                    "domain \"{domain}\" specified without hosted zone information; DNS alias record was not created"
                ),
                DomainContext::DashboardCustomDomain => write!(
                    f,
                    "dashboard domain \"{domain}\" specified without hosted zone information; custom domain will not be enabled"
                ),
                DomainContext::DashboardAlias => write!(
                    f,
                    "dashboard domain \"{domain}\" specified but a DNS alias could not be created (missing hosted zone or certificate)"
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_setting_names_the_dotted_path() {
        let err = ComposeError::MissingRequiredSetting {
            setting: "ecs.repository_name",
            reason: "prebuilt image source requires a repository".to_string(),
        };
        assert!(err.to_string().contains("`ecs.repository_name`"));
    }

    #[test]
    fn domain_warning_references_the_domain() {
        let warning = Warning::DomainWithoutZone {
            domain: "app.dev.example.com".to_string(),
            context: DomainContext::AlbAlias,
        };
        assert!(warning.to_string().contains("app.dev.example.com"));
    }
}
