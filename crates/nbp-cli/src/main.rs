// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use nbp_cli::{Cli, Parser};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Logs go to stderr so stdout stays clean for profile output
    cli.logging.init("nbp")?;

    cli.command.run(options)
}
