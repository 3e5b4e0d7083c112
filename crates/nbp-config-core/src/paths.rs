// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Profile file path discovery

use nbp_config_types::ProfileKind;
use std::path::PathBuf;

/// Profile file locations in precedence order
#[derive(Debug, Clone)]
pub struct Paths {
    pub system: Option<PathBuf>,
    pub user: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
}

impl Paths {
    /// Only an explicit file, no system or user layers
    pub fn explicit_only(path: impl Into<PathBuf>) -> Self {
        Self {
            system: None,
            user: None,
            explicit: Some(path.into()),
        }
    }
}

/// Conventional locations of the profile file for `kind`.
///
/// `JUPYTER_CONFIG_DIR` replaces `~/.jupyter` for the user layer and the first
/// entry of `JUPYTER_CONFIG_PATH` replaces the system directory.
pub fn discover_paths(kind: ProfileKind) -> Paths {
    let user_dir = std::env::var_os("JUPYTER_CONFIG_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".jupyter")));
    let system_dir = std::env::var_os("JUPYTER_CONFIG_PATH")
        .and_then(|path| std::env::split_paths(&path).find(|dir| !dir.as_os_str().is_empty()))
        .unwrap_or_else(system_config_dir);

    Paths {
        system: Some(system_dir.join(kind.file_name())),
        user: user_dir.map(|dir| dir.join(kind.file_name())),
        explicit: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_kind_file_name() {
        let paths = discover_paths(ProfileKind::Notebook);
        assert!(paths
            .system
            .unwrap()
            .ends_with("jupyter_notebook_config.toml"));
        if let Some(user) = paths.user {
            assert!(user.ends_with("jupyter_notebook_config.toml"));
        }
        assert!(paths.explicit.is_none());
    }
}
