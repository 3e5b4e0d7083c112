// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Profile roots for the two interface variants

use crate::lab::{LabApp, LabServerApp};
use crate::server::{NotebookApp, ServerApp};
use crate::services::{ContentsManager, MappingKernelManager};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Interface variant a profile configures. The kind fixes which namespaces
/// a profile may contain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    EnumIter,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// JupyterLab (`ServerApp`, `LabApp`, `LabServerApp`)
    Lab,
    /// Classic notebook (`NotebookApp`)
    Notebook,
}

impl ProfileKind {
    /// Namespace holding the network and auth settings for this kind
    pub fn server_namespace(self) -> &'static str {
        match self {
            ProfileKind::Lab => "ServerApp",
            ProfileKind::Notebook => "NotebookApp",
        }
    }

    /// Conventional file name of this kind's profile
    pub fn file_name(self) -> &'static str {
        match self {
            ProfileKind::Lab => "jupyter_lab_config.toml",
            ProfileKind::Notebook => "jupyter_notebook_config.toml",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Lab => write!(f, "lab"),
            ProfileKind::Notebook => write!(f, "notebook"),
        }
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lab" | "jupyterlab" => Ok(ProfileKind::Lab),
            "notebook" | "classic" => Ok(ProfileKind::Notebook),
            _ => Err(format!(
                "Unknown profile kind: {}. Use 'lab' or 'notebook'",
                s
            )),
        }
    }
}

/// Lab interface profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LabProfile {
    #[serde(rename = "ServerApp", default, skip_serializing_if = "ServerApp::is_unset")]
    pub server_app: ServerApp,
    #[serde(rename = "LabApp", default, skip_serializing_if = "LabApp::is_unset")]
    pub lab_app: LabApp,
    #[serde(
        rename = "LabServerApp",
        default,
        skip_serializing_if = "LabServerApp::is_unset"
    )]
    pub lab_server_app: LabServerApp,
    #[serde(
        rename = "ContentsManager",
        default,
        skip_serializing_if = "ContentsManager::is_unset"
    )]
    pub contents_manager: ContentsManager,
    #[serde(
        rename = "MappingKernelManager",
        default,
        skip_serializing_if = "MappingKernelManager::is_unset"
    )]
    pub kernel_manager: MappingKernelManager,
}

/// Classic notebook interface profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NotebookProfile {
    #[serde(rename = "NotebookApp", default, skip_serializing_if = "NotebookApp::is_unset")]
    pub notebook_app: NotebookApp,
    #[serde(
        rename = "ContentsManager",
        default,
        skip_serializing_if = "ContentsManager::is_unset"
    )]
    pub contents_manager: ContentsManager,
    #[serde(
        rename = "MappingKernelManager",
        default,
        skip_serializing_if = "MappingKernelManager::is_unset"
    )]
    pub kernel_manager: MappingKernelManager,
}

/// A constructed, immutable configuration profile of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Lab(LabProfile),
    Notebook(NotebookProfile),
}

impl Profile {
    /// Empty profile of the given kind: every option resolves to its default
    pub fn empty(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Lab => Profile::Lab(LabProfile::default()),
            ProfileKind::Notebook => Profile::Notebook(NotebookProfile::default()),
        }
    }

    pub fn kind(&self) -> ProfileKind {
        match self {
            Profile::Lab(_) => ProfileKind::Lab,
            Profile::Notebook(_) => ProfileKind::Notebook,
        }
    }

    pub fn server(&self) -> &ServerApp {
        match self {
            Profile::Lab(p) => &p.server_app,
            Profile::Notebook(p) => &p.notebook_app.server,
        }
    }

    pub fn contents_manager(&self) -> &ContentsManager {
        match self {
            Profile::Lab(p) => &p.contents_manager,
            Profile::Notebook(p) => &p.contents_manager,
        }
    }

    pub fn kernel_manager(&self) -> &MappingKernelManager {
        match self {
            Profile::Lab(p) => &p.kernel_manager,
            Profile::Notebook(p) => &p.kernel_manager,
        }
    }

    /// Lab-only sections; `None` for notebook profiles
    pub fn lab(&self) -> Option<(&LabApp, &LabServerApp)> {
        match self {
            Profile::Lab(p) => Some((&p.lab_app, &p.lab_server_app)),
            Profile::Notebook(_) => None,
        }
    }

    /// Configured content-manager class; always `None` for lab profiles
    pub fn contents_manager_class(&self) -> Option<&str> {
        match self {
            Profile::Lab(_) => None,
            Profile::Notebook(p) => p.notebook_app.contents_manager_class.as_deref(),
        }
    }
}
