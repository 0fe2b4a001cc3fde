//! `infra synth`: compose and emit the topology plan.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use config::{EnvironmentRegistry, GlobalsConfig};
use topology::{compose, ComposeRequest, TopologyPlan};

/// Plan serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Compose the topology plan for an environment.
#[derive(Args, Debug)]
pub struct SynthCommand {
    /// Target environment (dev, hml, prd). Defaults to dev.
    #[arg(short, long, env = "INFRA_ENV")]
    pub env: Option<String>,

    /// Deploy into this region instead of the environment default.
    #[arg(long, env = "INFRA_REGION")]
    pub region: Option<String>,

    /// Deploy this image tag instead of the environment default.
    #[arg(long, env = "INFRA_IMAGE_TAG")]
    pub image_tag: Option<String>,

    /// Plan output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the plan to this path instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SynthCommand {
    /// Runs the command.
    ///
    /// An unknown environment or inconsistent settings abort before any
    /// plan output is produced; warnings go to stderr and leave the exit
    /// code untouched.
    pub fn run(self) -> Result<()> {
        let registry = EnvironmentRegistry::builtin();
        let resolved = registry.resolve(self.env.as_deref())?;

        let mut request = ComposeRequest::new(resolved, GlobalsConfig::builtin());
        request.region_override = self.region.clone();
        request.image_tag_override = self.image_tag.clone();

        let plan = compose(&request)?;

        for warning in &plan.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }

        let rendered = render(&plan, self.format)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("failed to write plan to {}", path.display()))?;
                eprintln!(
                    "{} composed {} for {} ({})",
                    "ok:".green().bold(),
                    path.display(),
                    plan.environment,
                    plan.region
                );
            }
            None => print!("{rendered}"),
        }

        Ok(())
    }
}

fn render(plan: &TopologyPlan, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(plan)?,
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(plan)?;
            rendered.push('\n');
            rendered
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(env: &str) -> SynthCommand {
        SynthCommand {
            env: Some(env.to_string()),
            region: None,
            image_tag: None,
            format: OutputFormat::Yaml,
            output: None,
        }
    }

    #[test]
    fn unknown_environment_aborts_with_the_supported_list() {
        let err = command("bogus").run().unwrap_err();
        assert!(err.to_string().contains("dev, hml, prd"));
    }

    #[test]
    fn rendered_yaml_carries_the_stacks() {
        let registry = EnvironmentRegistry::builtin();
        let resolved = registry.resolve(Some("hml")).unwrap();
        let plan = compose(&ComposeRequest::new(resolved, GlobalsConfig::builtin())).unwrap();

        let yaml = render(&plan, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("network-hml"));
        assert!(yaml.contains("data-hml"));
        assert!(yaml.contains("app-hml"));
    }
}
