//! Container image source resolution.
//!
//! The fallback order is an explicit decision table rather than chained
//! optionals: strategies are evaluated in priority order and the first
//! applicable one wins.

use config::EcsSettings;
use serde::{Deserialize, Serialize};

use crate::error::ComposeError;

/// Where the service container image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ImageSource {
    /// Built from the application source tree at deploy time.
    BuildOnDeploy {
        /// Build context directory relative to the repository root.
        context_directory: String,
    },

    /// Pulled from a container registry repository.
    Registry {
        repository: String,

        /// Whether the repository itself is declared as part of the
        /// topology.
        managed: bool,

        tag: String,
    },
}

/// Resolves the image source for the compute tier.
///
/// Strategy order:
/// 1. `build_on_deploy`: build from the local `app/` tree.
/// 2. A configured repository: pull `repository:tag`, where the tag is the
///    invocation override when present, otherwise the settings default.
/// 3. Neither: composition fails before the compute tier declares
///    anything.
///
/// # Errors
///
/// [`ComposeError::MissingRequiredSetting`] when a prebuilt source is
/// requested without a repository identifier.
pub fn resolve_image_source(
    ecs: &EcsSettings,
    image_tag_override: Option<&str>,
) -> Result<ImageSource, ComposeError> {
    if ecs.build_on_deploy {
        return Ok(ImageSource::BuildOnDeploy {
            context_directory: "app".to_string(),
        });
    }

    let Some(repository) = ecs.repository_name.clone() else {
        return Err(ComposeError::MissingRequiredSetting {
            setting: "ecs.repository_name",
            reason: "a prebuilt image source requires a repository when build_on_deploy is false"
                .to_string(),
        });
    };

    let tag = image_tag_override
        .filter(|tag| !tag.is_empty())
        .map_or_else(|| ecs.image_tag.clone(), ToString::to_string);

    Ok(ImageSource::Registry {
        repository,
        managed: ecs.manage_repository,
        tag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ecs_settings(build: bool, repository: Option<&str>, managed: bool) -> EcsSettings {
        EcsSettings {
            build_on_deploy: build,
            cpu: 256,
            memory_mib: 512,
            desired_count: 1,
            repository_name: repository.map(ToString::to_string),
            manage_repository: managed,
            image_tag: "latest".to_string(),
            container_port: 8000,
            assign_public_ip: false,
            min_capacity: 1,
            max_capacity: 2,
            scaling_target_utilization: 60,
            requests_per_target: None,
            certificate_arn: None,
            domain_name: None,
            hosted_zone_id: None,
            hosted_zone_name: None,
        }
    }

    #[test]
    fn build_on_deploy_wins_over_repository() {
        let source = resolve_image_source(&ecs_settings(true, Some("app"), true), None).unwrap();
        assert!(matches!(source, ImageSource::BuildOnDeploy { .. }));
    }

    #[test]
    fn prebuilt_without_repository_is_a_missing_setting() {
        let err = resolve_image_source(&ecs_settings(false, None, false), None).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::MissingRequiredSetting {
                setting: "ecs.repository_name",
                ..
            }
        ));
    }

    #[test]
    fn tag_override_beats_settings_default() {
        let source =
            resolve_image_source(&ecs_settings(false, Some("django-app"), true), Some("v1.2.3"))
                .unwrap();
        assert_eq!(
            source,
            ImageSource::Registry {
                repository: "django-app".to_string(),
                managed: true,
                tag: "v1.2.3".to_string(),
            }
        );
    }

    #[test]
    fn empty_tag_override_falls_back_to_default() {
        let source =
            resolve_image_source(&ecs_settings(false, Some("django-app"), false), Some(""))
                .unwrap();
        assert_eq!(
            source,
            ImageSource::Registry {
                repository: "django-app".to_string(),
                managed: false,
                tag: "latest".to_string(),
            }
        );
    }
}
