//! `infra environments`: list the registered environments.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use config::EnvironmentRegistry;

/// List the registered environments.
#[derive(Args, Debug)]
pub struct EnvironmentsCommand {}

impl EnvironmentsCommand {
    pub fn run(self) -> Result<()> {
        let registry = EnvironmentRegistry::builtin();

        println!(
            "{:<8} {:<12} {:<10} {:<8} {}",
            "NAME".bold(),
            "REGION".bold(),
            "SERVICE".bold(),
            "CLIENT".bold(),
            "DASHBOARD".bold()
        );
        for (name, settings) in registry.iter() {
            let dashboard = settings
                .dashboard
                .as_ref()
                .is_some_and(|dashboard| dashboard.enabled);
            println!(
                "{:<8} {:<12} {:<10} {:<8} {}",
                name,
                settings.region,
                settings.service,
                settings.client,
                if dashboard { "yes" } else { "no" }
            );
        }

        Ok(())
    }
}
