//! Topology synthesizer CLI.
//!
//! Resolves an environment from the built-in registry, composes the tiered
//! topology plan, and emits it for the downstream provisioning engine. The
//! plan goes to stdout (or a file); logs and warnings go to stderr so the
//! plan stream stays clean.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::environments::EnvironmentsCommand;
use commands::synth::SynthCommand;

/// Deployment topology synthesizer.
#[derive(Parser)]
#[command(
    name = "infra",
    version,
    about = "Deployment topology synthesizer",
    long_about = "Compose the multi-tier deployment topology for an environment.\n\n\
                  Synthesis is deterministic: the same environment always resolves\n\
                  to the same resource names, tags, and dependency graph, so the\n\
                  plan can be re-emitted and re-applied idempotently."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the topology plan for an environment.
    ///
    /// Fails without emitting anything when the environment is unknown or
    /// its settings are inconsistent; warnings are surfaced on stderr and
    /// do not affect the exit code.
    Synth(SynthCommand),

    /// List the registered environments.
    Environments(EnvironmentsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("info,topology=debug,config=debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Synth(cmd) => cmd.run(),
        Commands::Environments(cmd) => cmd.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn synth_accepts_context_flags() {
        let cli = Cli::try_parse_from([
            "infra",
            "synth",
            "--env",
            "prd",
            "--region",
            "sa-east-1",
            "--image-tag",
            "v1.2.3",
            "--format",
            "json",
        ])
        .unwrap();

        let Commands::Synth(cmd) = cli.command else {
            panic!("expected synth subcommand");
        };
        assert_eq!(cmd.env.as_deref(), Some("prd"));
        assert_eq!(cmd.region.as_deref(), Some("sa-east-1"));
        assert_eq!(cmd.image_tag.as_deref(), Some("v1.2.3"));
    }

    #[test]
    #[serial]
    fn synth_reads_the_environment_selector_from_the_process_env() {
        std::env::set_var("INFRA_ENV", "hml");
        let cli = Cli::try_parse_from(["infra", "synth"]).unwrap();
        std::env::remove_var("INFRA_ENV");

        let Commands::Synth(cmd) = cli.command else {
            panic!("expected synth subcommand");
        };
        assert_eq!(cmd.env.as_deref(), Some("hml"));
    }

    #[test]
    #[serial]
    fn synth_flags_win_over_the_process_env() {
        std::env::set_var("INFRA_ENV", "hml");
        let cli = Cli::try_parse_from(["infra", "synth", "--env", "dev"]).unwrap();
        std::env::remove_var("INFRA_ENV");

        let Commands::Synth(cmd) = cli.command else {
            panic!("expected synth subcommand");
        };
        assert_eq!(cmd.env.as_deref(), Some("dev"));
    }
}
