// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Option table: every recognized key, its type, default and help text.
//!
//! The table is the single source of truth for what a profile may contain.
//! The typed structs in `nbp-config-types` mirror it field for field; the
//! JSON Schema emitted by [`json_schema`] is derived from those structs.

use nbp_config_types::{LabProfile, NotebookProfile, ProfileKind};
use serde_json::Value as J;
use std::fmt;

const BOTH: &[ProfileKind] = &[ProfileKind::Lab, ProfileKind::Notebook];
const LAB: &[ProfileKind] = &[ProfileKind::Lab];
const NOTEBOOK: &[ProfileKind] = &[ProfileKind::Notebook];

/// Configuration namespace an option lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    /// `ServerApp` for lab profiles, `NotebookApp` for notebook profiles
    Server,
    LabApp,
    LabServerApp,
    ContentsManager,
    MappingKernelManager,
}

impl Section {
    pub fn namespace(self, kind: ProfileKind) -> &'static str {
        match self {
            Section::Server => kind.server_namespace(),
            Section::LabApp => "LabApp",
            Section::LabServerApp => "LabServerApp",
            Section::ContentsManager => "ContentsManager",
            Section::MappingKernelManager => "MappingKernelManager",
        }
    }

    /// Comment header used when writing a profile
    pub fn title(self) -> &'static str {
        match self {
            Section::Server => "Server settings",
            Section::LabApp => "Lab settings",
            Section::LabServerApp => "Extension settings",
            Section::ContentsManager => "Content settings",
            Section::MappingKernelManager => "Kernel settings",
        }
    }
}

/// Value type of an option, including refined string types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Bool,
    Integer { min: i64, max: i64 },
    StringList,
    /// IP literal, hostname, or empty / `*` for all interfaces
    Address,
    /// Dotted identifier such as `package.module.Class`
    ClassName,
    /// Kernel spec name, `[A-Za-z0-9._-]+`
    KernelName,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Integer { min, max } => write!(f, "integer in {min}..={max}"),
            ValueType::StringList => write!(f, "list of strings"),
            ValueType::Address => write!(f, "IP address or hostname"),
            ValueType::ClassName => write!(f, "dotted class name"),
            ValueType::KernelName => write!(f, "kernel name"),
        }
    }
}

/// Built-in default of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Bool(bool),
    EmptyList,
}

impl DefaultValue {
    pub fn to_value(self) -> OptionValue {
        match self {
            DefaultValue::Str(s) => OptionValue::Str(s.to_string()),
            DefaultValue::Int(i) => OptionValue::Int(i),
            DefaultValue::Bool(b) => OptionValue::Bool(b),
            DefaultValue::EmptyList => OptionValue::List(Vec::new()),
        }
    }
}

/// Resolved value of an option as returned by `get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl OptionValue {
    /// Convert a validated JSON leaf. Returns `None` when the shape does not fit.
    pub fn from_json(value: &J) -> Option<Self> {
        match value {
            J::String(s) => Some(OptionValue::Str(s.clone())),
            J::Bool(b) => Some(OptionValue::Bool(*b)),
            J::Number(n) => n.as_i64().map(OptionValue::Int),
            J::Array(items) => items
                .iter()
                .map(|i| i.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(OptionValue::List),
            _ => None,
        }
    }

    pub fn to_json(&self) -> J {
        match self {
            OptionValue::Str(s) => J::String(s.clone()),
            OptionValue::Int(i) => J::from(*i),
            OptionValue::Bool(b) => J::Bool(*b),
            OptionValue::List(items) => J::Array(items.iter().cloned().map(J::String).collect()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{s}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::List(items) => {
                let quoted: Vec<String> = items.iter().map(|i| format!("{i:?}")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
        }
    }
}

/// One recognized option
#[derive(Debug)]
pub struct OptionSpec {
    pub section: Section,
    pub name: &'static str,
    pub value_type: ValueType,
    pub default: DefaultValue,
    pub help: &'static str,
    pub kinds: &'static [ProfileKind],
    /// Dotted name of the option that replaces this one
    pub deprecated_by: Option<&'static str>,
}

impl OptionSpec {
    pub fn applies_to(&self, kind: ProfileKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Dotted key of this option within a profile of `kind`
    pub fn key(&self, kind: ProfileKind) -> String {
        format!("{}.{}", self.section.namespace(kind), self.name)
    }

    /// Whether the value is a secret that should not be echoed
    pub fn is_secret(&self) -> bool {
        self.section == Section::Server && matches!(self.name, "token" | "password")
    }
}

/// All recognized options, in the order they are written out.
pub static OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        section: Section::Server,
        name: "ip",
        value_type: ValueType::Address,
        default: DefaultValue::Str("localhost"),
        help: "Address the server binds to",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "port",
        value_type: ValueType::Integer { min: 0, max: 65535 },
        default: DefaultValue::Int(8888),
        help: "Port the server listens on",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "open_browser",
        value_type: ValueType::Bool,
        default: DefaultValue::Bool(true),
        help: "Launch a web browser after the server starts",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "token",
        value_type: ValueType::String,
        default: DefaultValue::Str(""),
        help: "Bearer token required by clients; empty disables token authentication",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "password",
        value_type: ValueType::String,
        default: DefaultValue::Str(""),
        help: "Password required to log in; empty disables password authentication",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "allow_origin",
        value_type: ValueType::String,
        default: DefaultValue::Str(""),
        help: "Value of the Access-Control-Allow-Origin header; `*` allows any origin",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "allow_remote_access",
        value_type: ValueType::Bool,
        default: DefaultValue::Bool(false),
        help: "Accept connections whose Host header is not a loopback address",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::Server,
        name: "contents_manager_class",
        value_type: ValueType::ClassName,
        default: DefaultValue::Str("notebook.services.contents.filemanager.FileContentsManager"),
        help: "Content-manager implementation to instantiate",
        kinds: NOTEBOOK,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::LabApp,
        name: "collaborative",
        value_type: ValueType::Bool,
        default: DefaultValue::Bool(false),
        help: "Enable real-time collaborative editing between clients",
        kinds: LAB,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::LabApp,
        name: "dev_mode",
        value_type: ValueType::Bool,
        default: DefaultValue::Bool(false),
        help: "Run the lab frontend in developer mode",
        kinds: LAB,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::ContentsManager,
        name: "allow_hidden",
        value_type: ValueType::Bool,
        default: DefaultValue::Bool(false),
        help: "Expose hidden files and directories through the content manager",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::MappingKernelManager,
        name: "default_kernel_name",
        value_type: ValueType::KernelName,
        default: DefaultValue::Str("python3"),
        help: "Kernel started when a session does not name one",
        kinds: BOTH,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::LabServerApp,
        name: "blacklist_uris",
        value_type: ValueType::StringList,
        default: DefaultValue::EmptyList,
        help: "Extension URIs that are denied; empty means unrestricted",
        kinds: LAB,
        deprecated_by: Some("LabServerApp.blocked_extensions_uris"),
    },
    OptionSpec {
        section: Section::LabServerApp,
        name: "whitelist_uris",
        value_type: ValueType::StringList,
        default: DefaultValue::EmptyList,
        help: "Extension URIs that are allowed; empty means unrestricted",
        kinds: LAB,
        deprecated_by: Some("LabServerApp.allowed_extensions_uris"),
    },
    OptionSpec {
        section: Section::LabServerApp,
        name: "blocked_extensions_uris",
        value_type: ValueType::StringList,
        default: DefaultValue::EmptyList,
        help: "Extension URIs that are denied; empty means unrestricted",
        kinds: LAB,
        deprecated_by: None,
    },
    OptionSpec {
        section: Section::LabServerApp,
        name: "allowed_extensions_uris",
        value_type: ValueType::StringList,
        default: DefaultValue::EmptyList,
        help: "Extension URIs that are allowed; empty means unrestricted",
        kinds: LAB,
        deprecated_by: None,
    },
];

/// Options recognized for `kind`, in table order
pub fn options_for(kind: ProfileKind) -> impl Iterator<Item = &'static OptionSpec> {
    OPTIONS.iter().filter(move |o| o.applies_to(kind))
}

/// Resolve a key to its option.
///
/// `key` is either a dotted `Namespace.name` or a bare `name`; bare names are
/// unique within a kind.
pub fn lookup(kind: ProfileKind, key: &str) -> Option<&'static OptionSpec> {
    match key.split_once('.') {
        Some((namespace, name)) => options_for(kind)
            .find(|o| o.name == name && o.section.namespace(kind) == namespace),
        None => options_for(kind).find(|o| o.name == key),
    }
}

/// Namespaces that occur in profiles of `kind`
pub fn namespaces(kind: ProfileKind) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for option in options_for(kind) {
        let ns = option.section.namespace(kind);
        if !out.contains(&ns) {
            out.push(ns);
        }
    }
    out
}

/// JSON Schema describing a profile of `kind`
pub fn json_schema(kind: ProfileKind) -> J {
    let root = match kind {
        ProfileKind::Lab => schemars::schema_for!(LabProfile),
        ProfileKind::Notebook => schemars::schema_for!(NotebookProfile),
    };
    serde_json::to_value(root).unwrap_or(J::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_keys_are_unique_per_kind() {
        for kind in [ProfileKind::Lab, ProfileKind::Notebook] {
            let keys: Vec<String> = options_for(kind).map(|o| o.key(kind)).collect();
            let unique: BTreeSet<&String> = keys.iter().collect();
            assert_eq!(keys.len(), unique.len(), "duplicate key for {kind}");

            let names: BTreeSet<&str> = options_for(kind).map(|o| o.name).collect();
            assert_eq!(names.len(), keys.len(), "bare names must be unique for {kind}");
        }
    }

    #[test]
    fn test_lookup_dotted_and_bare() {
        let port = lookup(ProfileKind::Lab, "ServerApp.port").unwrap();
        assert_eq!(port.name, "port");
        assert!(std::ptr::eq(port, lookup(ProfileKind::Lab, "port").unwrap()));

        assert!(lookup(ProfileKind::Lab, "NotebookApp.port").is_none());
        assert!(lookup(ProfileKind::Notebook, "NotebookApp.port").is_some());
        assert!(lookup(ProfileKind::Notebook, "LabApp.collaborative").is_none());
        assert!(lookup(ProfileKind::Lab, "contents_manager_class").is_none());
        assert!(lookup(ProfileKind::Lab, "foo_bar").is_none());
    }

    #[test]
    fn test_namespaces_per_kind() {
        assert_eq!(
            namespaces(ProfileKind::Notebook),
            vec!["NotebookApp", "ContentsManager", "MappingKernelManager"]
        );
        let lab = namespaces(ProfileKind::Lab);
        assert!(lab.contains(&"ServerApp"));
        assert!(lab.contains(&"LabServerApp"));
        assert!(!lab.contains(&"NotebookApp"));
    }

    #[test]
    fn test_schema_properties_match_table() {
        for kind in [ProfileKind::Lab, ProfileKind::Notebook] {
            let schema = json_schema(kind);
            let props = schema["properties"].as_object().unwrap();
            for ns in namespaces(kind) {
                assert!(props.contains_key(ns), "{ns} missing from {kind} schema");
            }
        }
    }

    #[test]
    fn test_option_value_display() {
        assert_eq!(OptionValue::Int(8888).to_string(), "8888");
        assert_eq!(
            OptionValue::List(vec!["a".into(), "b".into()]).to_string(),
            r#"["a", "b"]"#
        );
        assert_eq!(DefaultValue::EmptyList.to_value(), OptionValue::List(vec![]));
    }

    #[test]
    fn test_secret_options() {
        let secrets: Vec<&str> =
            OPTIONS.iter().filter(|o| o.is_secret()).map(|o| o.name).collect();
        assert_eq!(secrets, vec!["token", "password"]);
    }
}
