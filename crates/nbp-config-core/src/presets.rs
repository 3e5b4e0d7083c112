// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The bundled lab and notebook profiles

use crate::error::Result;
use crate::loader::{self, LoadOptions, Loaded};
use nbp_config_types::ProfileKind;

pub const LAB: &str = include_str!("../../../profiles/jupyter_lab_config.toml");
pub const NOTEBOOK: &str = include_str!("../../../profiles/jupyter_notebook_config.toml");

/// Source text of the bundled profile for `kind`
pub fn source(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Lab => LAB,
        ProfileKind::Notebook => NOTEBOOK,
    }
}

/// Load the bundled profile for `kind` in strict mode
pub fn load(kind: ProfileKind) -> Result<Loaded> {
    loader::load_str(source(kind), &LoadOptions::strict().with_kind(kind))
}
