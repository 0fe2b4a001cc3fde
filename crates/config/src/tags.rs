//! Tag policy: merge of global defaults with per-environment overrides and
//! derivation of the applied tag map for a deployable unit.

use std::collections::BTreeMap;

use crate::environments::EnvironmentSettings;
use crate::globals::{GlobalTagValues, GlobalsConfig, TagOverrides};

/// Shallow per-key merge of tag overrides over the global defaults.
///
/// Each override key strictly replaces the corresponding default; keys
/// absent from the override set retain the default value. Pure function, no
/// failure modes.
#[must_use]
pub fn resolve_tags(defaults: &GlobalTagValues, overrides: Option<&TagOverrides>) -> GlobalTagValues {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        if let Some(project) = &overrides.project {
            merged.project = project.clone();
        }
        if let Some(owner) = &overrides.owner {
            merged.owner = owner.clone();
        }
        if let Some(managed_by) = &overrides.managed_by {
            merged.managed_by = managed_by.clone();
        }
        if let Some(confidentiality) = &overrides.confidentiality {
            merged.confidentiality = confidentiality.clone();
        }
    }
    merged
}

/// Override set applied to every stack of an environment: the environment's
/// confidentiality classification (falling back to the global default),
/// with the environment's explicit tag overrides winning per-key on top.
#[must_use]
pub fn stack_overrides(settings: &EnvironmentSettings, globals: &GlobalsConfig) -> TagOverrides {
    let confidentiality = settings
        .confidentiality
        .clone()
        .unwrap_or_else(|| globals.tags.confidentiality.clone());

    let mut overrides = TagOverrides {
        confidentiality: Some(confidentiality),
        ..TagOverrides::default()
    };

    if let Some(env_overrides) = &settings.tag_overrides {
        if env_overrides.project.is_some() {
            overrides.project = env_overrides.project.clone();
        }
        if env_overrides.owner.is_some() {
            overrides.owner = env_overrides.owner.clone();
        }
        if env_overrides.managed_by.is_some() {
            overrides.managed_by = env_overrides.managed_by.clone();
        }
        if env_overrides.confidentiality.is_some() {
            overrides.confidentiality = env_overrides.confidentiality.clone();
        }
    }

    overrides
}

/// The tag map actually applied to a deployable unit.
///
/// `Environment` is appended after the merge and is supplied by the caller
/// per unit; it is not part of the overridable value set.
#[must_use]
pub fn applied_tags(env_name: &str, values: &GlobalTagValues) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    tags.insert("Project".to_string(), values.project.clone());
    tags.insert("Owner".to_string(), values.owner.clone());
    tags.insert("ManagedBy".to_string(), values.managed_by.clone());
    tags.insert("Confidentiality".to_string(), values.confidentiality.clone());
    tags.insert("Environment".to_string(), env_name.to_string());
    tags
}
