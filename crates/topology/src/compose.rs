//! One-shot topology composition.
//!
//! Resolution order is fixed: validate the compute-tier decision tables
//! first (so nothing is declared when composition is doomed), then declare
//! network → data → compute, threading each tier's outputs into the next
//! explicitly.

use std::collections::BTreeMap;

use chrono::Utc;
use config::{
    applied_tags, resolve_tags, stack_overrides, EnvironmentSettings, GlobalsConfig,
    ResolvedEnvironment, ResourceNamer,
};
use tracing::info;

use crate::certificate::{resolve_alb_certificate, tls_decision};
use crate::error::ComposeError;
use crate::image::resolve_image_source;
use crate::plan::TopologyPlan;
use crate::{compute, data, network};

/// Everything the tier declarations need, resolved once per composition.
#[derive(Debug)]
pub struct TierContext<'a> {
    pub env_name: &'a str,
    pub region: &'a str,
    pub settings: &'a EnvironmentSettings,
    pub globals: &'a GlobalsConfig,
    pub namer: &'a ResourceNamer,
    pub tags: &'a BTreeMap<String, String>,
}

/// A composition request: the resolved environment plus the invocation
/// context overrides.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub environment: ResolvedEnvironment,
    pub globals: GlobalsConfig,

    /// Region override from the invocation context; absent uses the
    /// environment default.
    pub region_override: Option<String>,

    /// Image tag override from the invocation context; absent uses the
    /// environment default.
    pub image_tag_override: Option<String>,
}

impl ComposeRequest {
    /// Request with no context overrides.
    #[must_use]
    pub fn new(environment: ResolvedEnvironment, globals: GlobalsConfig) -> Self {
        Self {
            environment,
            globals,
            region_override: None,
            image_tag_override: None,
        }
    }
}

/// Composes the full topology plan for one environment.
///
/// # Errors
///
/// [`ComposeError::MissingRequiredSetting`] when the compute settings are
/// inconsistent (prebuilt image without a repository, TLS enforcement
/// without a certificate). Validation runs before any tier is declared, so
/// a failed composition yields no partial topology.
pub fn compose(request: &ComposeRequest) -> Result<TopologyPlan, ComposeError> {
    let env_name = request.environment.name.as_str();
    let settings = &request.environment.settings;

    let region = request
        .region_override
        .as_deref()
        .filter(|region| !region.is_empty())
        .unwrap_or(settings.region.as_str())
        .to_string();

    let namer = ResourceNamer::for_environment(env_name, settings);
    let merged = resolve_tags(
        &request.globals.tags,
        Some(&stack_overrides(settings, &request.globals)),
    );
    let tags = applied_tags(env_name, &merged);

    // Decision tables run before anything is declared.
    let image_source =
        resolve_image_source(&settings.ecs, request.image_tag_override.as_deref())?;
    let alb_certificate = resolve_alb_certificate(&settings.ecs);
    let tls = tls_decision(&request.globals.security, alb_certificate.as_ref())?;

    let ctx = TierContext {
        env_name,
        region: &region,
        settings,
        globals: &request.globals,
        namer: &namer,
        tags: &tags,
    };

    let network = network::declare(&ctx);
    let data = data::declare(&ctx, &network.outputs);
    let app = compute::declare(&ctx, &network.outputs, &data.outputs, &image_source, &tls);

    let plan = TopologyPlan {
        environment: env_name.to_string(),
        region,
        generated_at: Utc::now(),
        stacks: vec![network.stack, data.stack, app.stack],
        warnings: app.warnings,
    };

    // The dependency graph is acyclic by construction; verify anyway so a
    // broken tier declaration fails here rather than at provisioning time.
    plan.toposort()?;

    info!(
        environment = env_name,
        stacks = plan.stacks.len(),
        warnings = plan.warnings.len(),
        "composed topology plan"
    );

    Ok(plan)
}
