// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Lab-only sections

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabApp {
    /// Multi-client collaborative editing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "bool")]
    pub collaborative: Option<bool>,
    /// Developer diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "bool")]
    pub dev_mode: Option<bool>,
}

impl LabApp {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// Extension URI filtering. An empty list means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabServerApp {
    /// Extension URIs that are denied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Vec<String>")]
    pub blacklist_uris: Option<Vec<String>>,
    /// Extension URIs that are allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Vec<String>")]
    pub whitelist_uris: Option<Vec<String>>,
    /// Extension URIs that are denied (replaces `blacklist_uris`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Vec<String>")]
    pub blocked_extensions_uris: Option<Vec<String>>,
    /// Extension URIs that are allowed (replaces `whitelist_uris`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Vec<String>")]
    pub allowed_extensions_uris: Option<Vec<String>>,
}

impl LabServerApp {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}
