// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use nbp_config_core::{LoadOptions, Strictness};
use nbp_config_types::ProfileKind;
use nbp_logging::CliLoggingArgs;

pub mod profile_commands;

#[derive(clap::Parser)]
#[command(
    name = "nbp",
    about = "Inspect, check and convert notebook server profiles",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Profile kind; inferred from the file contents or name when omitted
    #[arg(long, value_enum, global = true)]
    pub kind: Option<ProfileKind>,
    /// Treat unrecognized options as errors instead of ignoring them
    #[arg(long, global = true)]
    pub strict: bool,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    #[command(subcommand)]
    pub command: profile_commands::ProfileCommands,
}

impl Cli {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            kind: self.kind,
            strictness: if self.strict {
                Strictness::Strict
            } else {
                Strictness::Permissive
            },
        }
    }
}

pub use clap::Parser;
