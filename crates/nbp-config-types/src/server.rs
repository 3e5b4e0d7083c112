// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Network and authentication settings of the HTTP server

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// JSON Schema `format` of bind addresses; validators register a checker under this name
pub const ADDRESS_FORMAT: &str = "address";

fn address_schema(gen: &mut SchemaGenerator) -> Schema {
    let mut schema = gen.subschema_for::<String>().into_object();
    schema.format = Some(ADDRESS_FORMAT.to_string());
    schema.into()
}

/// Server settings shared by both interface variants.
///
/// Lab profiles carry these under the `ServerApp` namespace, notebook
/// profiles under `NotebookApp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServerApp {
    /// Bind address: IP literal, hostname, or empty / `*` for all interfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "address_schema")]
    pub ip: Option<String>,
    /// Bind port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "u16", range(min = 0, max = 65535))]
    pub port: Option<u16>,
    /// Launch a browser on start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "bool")]
    pub open_browser: Option<bool>,
    /// Bearer-token secret; empty disables token auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String")]
    pub token: Option<String>,
    /// Password secret; empty disables password auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String")]
    pub password: Option<String>,
    /// CORS allowed origin pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String")]
    pub allow_origin: Option<String>,
    /// Accept clients from non-loopback addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "bool")]
    pub allow_remote_access: Option<bool>,
}

impl ServerApp {
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// Classic notebook server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotebookApp {
    #[serde(flatten)]
    pub server: ServerApp,
    /// Fully-qualified identifier of the content-manager implementation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        with = "String",
        regex(pattern = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
    )]
    pub contents_manager_class: Option<String>,
}

impl NotebookApp {
    pub fn is_unset(&self) -> bool {
        self.server.is_unset() && self.contents_manager_class.is_none()
    }
}
