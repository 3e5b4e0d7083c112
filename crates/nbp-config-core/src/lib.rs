// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration engine for notebook server profiles.
//!
//! A profile is a flat set of `Namespace.key = value` assignments for either
//! the lab or the classic notebook interface. This crate parses profile files,
//! checks every assignment against the option table in [`schema`], builds the
//! typed [`Profile`], and writes profiles back out. Loading never applies a
//! profile partially: either every recognized key is valid, or the caller gets
//! the full list of violations through [`Error::Rejected`].
//!
//! Several profile files can be layered (system < user < explicit) with
//! [`load_all`], which also records where each value came from.

pub mod access;
pub mod document;
pub mod error;
pub mod extract;
pub mod legacy;
pub mod loader;
pub mod merge;
pub mod paths;
pub mod presets;
pub mod provenance;
pub mod schema;
pub mod serialize;
pub mod validate;

pub use access::{entries, get, Entry};
pub use error::{Error, Rejection, Result, Severity, Violation, ViolationKind};
pub use loader::{load_file, load_str, LoadOptions, Loaded, Strictness};
pub use nbp_config_types::{Profile, ProfileKind};
pub use provenance::{Origin, Provenance, Scope};
pub use schema::{OptionSpec, OptionValue};
pub use serialize::to_toml;
pub use validate::validate;

use document::Document;

/// A layered profile with provenance information
#[derive(Debug, Clone)]
pub struct Resolved {
    pub loaded: Loaded,
    pub provenance: Provenance,
}

/// Load and merge every existing profile layer.
///
/// Precedence order: system < user < explicit. Missing system and user files
/// are skipped; a missing explicit file is an error. The merged assignments
/// are validated as one profile.
pub fn load_all(paths: &paths::Paths, options: &LoadOptions) -> Result<Resolved> {
    let layers = [
        (paths.system.as_deref(), Scope::System),
        (paths.user.as_deref(), Scope::User),
        (paths.explicit.as_deref(), Scope::Explicit),
    ];

    let mut merged = Document::new();
    let mut provenance = Provenance::default();
    let mut last_path = None;

    for (path, scope) in layers {
        let Some(path) = path else {
            continue;
        };
        if scope != Scope::Explicit && !path.exists() {
            continue;
        }
        let layer = loader::read_document(path)?;
        tracing::debug!(%scope, path = %path.display(), options = layer.len(), "merging profile layer");
        provenance.record_layer(&layer, scope, path);
        merge::overlay(&mut merged, layer);
        last_path = Some(path);
    }

    let loaded = loader::load_document(merged, options, last_path)?;
    Ok(Resolved { loaded, provenance })
}
