// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only
#![allow(clippy::disallowed_methods)] // CLI commands intentionally print to stdout/stderr

//! Profile inspection and conversion commands
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use nbp_config_core::{
    entries, get, load_all, load_file, loader, paths, presets, schema, to_toml, Entry, Error,
    LoadOptions, OptionSpec,
};
use nbp_config_types::ProfileKind;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show resolved option values
    ///
    /// Without a file, the system and user profiles are layered, user last.
    Show {
        /// Profile file to show
        file: Option<PathBuf>,
        /// Also list options left at their default
        #[arg(long)]
        defaults: bool,
        /// Show which file and line set each value
        #[arg(long)]
        show_origin: bool,
        /// List the values that lower layers assigned and the winner overrides
        #[arg(long)]
        history: bool,
        /// Print token and password values instead of redacting them
        #[arg(long)]
        reveal: bool,
    },
    /// Print the value of one option, or its default when unset
    Get {
        /// Profile file
        file: PathBuf,
        /// Dotted option name, or a bare name such as `port`
        key: String,
    },
    /// Check a profile and list every violation
    Validate {
        /// Profile file to check
        file: PathBuf,
    },
    /// Describe a recognized option
    Explain {
        /// Dotted option name, or a bare name such as `port`
        key: String,
    },
    /// Print the canonical TOML form of a profile
    Dump {
        /// Profile file
        file: PathBuf,
    },
    /// Convert a `c.Namespace.key = value` profile to TOML
    Import {
        /// Assignment-format profile, usually a `.py` file
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the bundled profile for a kind
    Init {
        #[arg(value_enum, value_name = "KIND")]
        profile: ProfileKind,
        /// Destination; defaults to the conventional file name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the JSON Schema of a profile kind
    Schema {
        #[arg(value_enum, value_name = "KIND")]
        profile: ProfileKind,
    },
}

impl ProfileCommands {
    pub fn run(self, options: LoadOptions) -> Result<()> {
        match self {
            ProfileCommands::Show {
                file,
                defaults,
                show_origin,
                history,
                reveal,
            } => show_profile(
                file.as_deref(),
                ShowFlags {
                    defaults,
                    show_origin,
                    history,
                    reveal,
                },
                options,
            ),
            ProfileCommands::Get { file, key } => get_option(&file, &key, options),
            ProfileCommands::Validate { file } => validate_profile(&file, options),
            ProfileCommands::Explain { key } => explain_option(&key, options.kind),
            ProfileCommands::Dump { file } => dump_profile(&file, options),
            ProfileCommands::Import { file, output } => {
                import_profile(&file, output.as_deref(), options)
            }
            ProfileCommands::Init {
                profile,
                output,
                force,
            } => init_profile(profile, output, force),
            ProfileCommands::Schema { profile } => print_schema(profile),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ShowFlags {
    defaults: bool,
    show_origin: bool,
    history: bool,
    reveal: bool,
}

fn show_profile(file: Option<&Path>, flags: ShowFlags, options: LoadOptions) -> Result<()> {
    let (paths, options) = match file {
        Some(file) => (paths::Paths::explicit_only(file), options),
        None => {
            let kind = options.kind.unwrap_or(ProfileKind::Lab);
            (paths::discover_paths(kind), options.with_kind(kind))
        }
    };
    let resolved = load_all(&paths, &options).context("Failed to load profile")?;

    for entry in entries(&resolved.loaded.profile)? {
        if entry.is_default && !flags.defaults {
            continue;
        }
        let mut line = format!("{}={}", entry.key, display_value(&entry, flags.reveal));
        if entry.is_default {
            line.push_str(" (default)");
        } else if flags.show_origin {
            if let Some(origin) = resolved.provenance.origin(&entry.key) {
                line.push_str(&format!(" (from {origin})"));
            }
        }
        println!("{line}");

        if flags.history && !entry.is_default {
            let history = resolved.provenance.history(&entry.key);
            for (scope, value) in history.iter().rev().skip(1) {
                println!(
                    "  overrides {scope}: {}",
                    display_json(entry.spec, value, flags.reveal)
                );
            }
        }
    }

    Ok(())
}

fn display_value(entry: &Entry, reveal: bool) -> String {
    display_json(entry.spec, &entry.value.to_json(), reveal)
}

/// Secrets are redacted unless empty; an empty secret means the check is off
fn display_json(spec: &OptionSpec, value: &serde_json::Value, reveal: bool) -> String {
    let hidden = spec.is_secret() && !reveal && value.as_str().is_some_and(|s| !s.is_empty());
    if hidden {
        nbp_logging::redact(value).to_string()
    } else {
        value.to_string()
    }
}

fn get_option(file: &Path, key: &str, options: LoadOptions) -> Result<()> {
    let loaded = load_file(file, &options)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let value = get(&loaded.profile, key)?;
    println!("{value}");
    Ok(())
}

fn validate_profile(file: &Path, options: LoadOptions) -> Result<()> {
    let (violations, ignored) = match load_file(file, &options) {
        Ok(loaded) => (loaded.warnings, loaded.ignored),
        Err(Error::Rejected(rejection)) => (rejection.violations, rejection.ignored),
        Err(e) => return Err(e).with_context(|| format!("Failed to load {}", file.display())),
    };

    for violation in &violations {
        println!("{violation}");
    }
    for key in &ignored {
        println!("warning: {key}: unknown option, ignored");
    }

    let errors = violations.iter().filter(|v| v.is_fatal()).count();
    let warnings = violations.len() - errors + ignored.len();
    if errors == 0 && warnings == 0 {
        println!("{}: ok", file.display());
    } else {
        println!(
            "{}: {} error(s), {} warning(s)",
            file.display(),
            errors,
            warnings
        );
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn explain_option(key: &str, kind: Option<ProfileKind>) -> Result<()> {
    let matches: Vec<_> = ProfileKind::iter()
        .filter(|k| kind.map_or(true, |wanted| wanted == *k))
        .filter_map(|k| schema::lookup(k, key).map(|spec| (k, spec)))
        .collect();

    if matches.is_empty() {
        return Err(Error::UnknownOption {
            key: key.to_string(),
        }
        .into());
    }

    for (i, (kind, spec)) in matches.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({kind})", spec.key(*kind));
        println!("  type: {}", spec.value_type);
        println!("  default: {}", spec.default.to_value().to_json());
        if let Some(replacement) = spec.deprecated_by {
            println!("  deprecated: use {replacement}");
        }
        println!("  {}", spec.help);
    }

    Ok(())
}

fn dump_profile(file: &Path, options: LoadOptions) -> Result<()> {
    let loaded = load_file(file, &options)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    print!("{}", to_toml(&loaded.profile)?);
    Ok(())
}

fn import_profile(file: &Path, output: Option<&Path>, options: LoadOptions) -> Result<()> {
    let doc = loader::read_document(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let loaded = loader::load_document(doc, &options, Some(file))
        .with_context(|| format!("Failed to import {}", file.display()))?;
    let text = to_toml(&loaded.profile)?;

    match output {
        Some(out) => {
            std::fs::write(out, &text)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            tracing::info!(from = %file.display(), to = %out.display(), "imported profile");
            println!("Wrote {} profile to {}", loaded.profile.kind(), out.display());
        }
        None => print!("{text}"),
    }

    Ok(())
}

fn init_profile(kind: ProfileKind, output: Option<PathBuf>, force: bool) -> Result<()> {
    let out = output.unwrap_or_else(|| PathBuf::from(kind.file_name()));
    if out.exists() && !force {
        bail!(
            "{} already exists; use --force to overwrite it",
            out.display()
        );
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&out, presets::source(kind))
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("Wrote {kind} profile to {}", out.display());
    Ok(())
}

fn print_schema(kind: ProfileKind) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&schema::json_schema(kind))?
    );
    Ok(())
}
