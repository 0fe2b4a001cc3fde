//! CLI subcommands.

pub mod environments;
pub mod synth;
