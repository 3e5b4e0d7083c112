// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Content-manager and kernel-manager sections, shared by both profile kinds

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentsManager {
    /// Expose dotfiles and hidden paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "bool")]
    pub allow_hidden: Option<bool>,
}

impl ContentsManager {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MappingKernelManager {
    /// Kernel used when a session does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String", regex(pattern = r"^[A-Za-z0-9._-]+$"))]
    pub default_kernel_name: Option<String>,
}

impl MappingKernelManager {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}
