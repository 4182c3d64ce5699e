//! CLI subcommand implementations

pub mod detect;
pub mod severity;
