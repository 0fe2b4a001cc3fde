//! Deployment configuration for the topology synthesizer.
//!
//! This crate holds the pure, I/O-free half of the system: the environment
//! registry (`dev`, `hml`, `prd` settings bundles), the canonical naming
//! convention, and the tag policy. Everything here is deterministic:
//! resolving the same environment twice yields the same settings, names,
//! and tags, which is what makes repeated synthesis idempotent.
//!
//! # Usage
//!
//! ```
//! use config::{EnvironmentRegistry, GlobalsConfig, ResourceNamer};
//!
//! let registry = EnvironmentRegistry::builtin();
//! let resolved = registry.resolve(Some("dev")).unwrap();
//! let namer = ResourceNamer::for_environment(&resolved.name, &resolved.settings);
//! assert_eq!(namer.resource("alb"), "dev-djg-alb-ander");
//!
//! let globals = GlobalsConfig::builtin();
//! assert_eq!(globals.tags.project, "django-ecs");
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod environments;
pub mod error;
pub mod globals;
pub mod naming;
pub mod tags;

pub use environments::{
    AlbAccessLogSettings, DashboardSettings, EcsSettings, EnvironmentRegistry,
    EnvironmentSettings, NatInstanceSettings, ObservabilitySettings, RdsSettings,
    ResolvedEnvironment, VpcSettings, DEFAULT_ENVIRONMENT,
};
pub use error::ConfigError;
pub use globals::{GlobalTagValues, GlobalsConfig, KmsAliases, SecurityDefaults, TagOverrides};
pub use naming::ResourceNamer;
pub use tags::{applied_tags, resolve_tags, stack_overrides};
