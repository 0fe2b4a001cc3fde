//! Canonical resource naming.
//!
//! Every declared resource carries a name derived from the same four-tuple,
//! so repeated synthesis of the same environment always addresses the same
//! logical resources.

use crate::environments::EnvironmentSettings;

/// Derives canonical resource names for one environment.
///
/// The derivation is pure: `{env}-{service}-{resource}-{client}`, joined
/// with hyphens and lowercased. No truncation or collision handling is
/// performed here; a downstream length limit is the downstream system's to
/// report.
#[derive(Debug, Clone)]
pub struct ResourceNamer {
    env: String,
    service: String,
    client: String,
}

impl ResourceNamer {
    #[must_use]
    pub fn new(env: impl Into<String>, service: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            service: service.into(),
            client: client.into(),
        }
    }

    /// Namer for a resolved environment.
    #[must_use]
    pub fn for_environment(env_name: &str, settings: &EnvironmentSettings) -> Self {
        Self::new(env_name, settings.service.clone(), settings.client.clone())
    }

    /// Canonical name for a resource kind, e.g. `resource("alb")`.
    #[must_use]
    pub fn resource(&self, kind: &str) -> String {
        format!("{}-{}-{}-{}", self.env, self.service, kind, self.client).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_components_in_fixed_order() {
        let namer = ResourceNamer::new("dev", "djg", "ander");
        assert_eq!(namer.resource("alb"), "dev-djg-alb-ander");
    }

    #[test]
    fn lowercases_the_entire_result() {
        let namer = ResourceNamer::new("DEV", "Django", "Ander");
        assert_eq!(namer.resource("RDS"), "dev-django-rds-ander");
    }

    #[test]
    fn identical_inputs_yield_identical_names() {
        let namer = ResourceNamer::new("prd", "django", "and");
        assert_eq!(namer.resource("ecs-cluster"), namer.resource("ecs-cluster"));
    }

    #[test]
    fn distinct_resource_kinds_never_collide() {
        let namer = ResourceNamer::new("dev", "djg", "ander");
        assert_ne!(namer.resource("sg-ecs"), namer.resource("sg-nat"));
    }
}
