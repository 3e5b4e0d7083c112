// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed extraction of validated documents

use crate::document::Document;
use crate::error::{Error, Result};
use nbp_config_types::{LabProfile, NotebookProfile, Profile, ProfileKind};
use serde::de::DeserializeOwned;
use serde_json::Value as J;

/// Deserialize a JSON tree into a typed value, reporting the failing path
pub fn get<T: DeserializeOwned>(root: &J) -> Result<T> {
    serde_path_to_error::deserialize(root.clone())
        .map_err(|e| Error::Extract(format!("at '{}': {}", e.path(), e.inner())))
}

/// Build the typed profile of `kind` from a validated document
pub fn profile(doc: &Document, kind: ProfileKind) -> Result<Profile> {
    let json = doc.to_json();
    Ok(match kind {
        ProfileKind::Lab => Profile::Lab(get::<LabProfile>(&json)?),
        ProfileKind::Notebook => Profile::Notebook(get::<NotebookProfile>(&json)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Assignment;
    use serde_json::json;

    #[test]
    fn test_extract_notebook_profile() {
        let doc: Document = [
            Assignment::new("NotebookApp.port", json!(9000), None),
            Assignment::new(
                "NotebookApp.contents_manager_class",
                json!("notebook.services.contents.largefilemanager.LargeFileManager"),
                None,
            ),
            Assignment::new("MappingKernelManager.default_kernel_name", json!("python3"), None),
        ]
        .into_iter()
        .collect();

        let profile = profile(&doc, ProfileKind::Notebook).unwrap();
        assert_eq!(profile.server().port, Some(9000));
        assert_eq!(
            profile.contents_manager_class(),
            Some("notebook.services.contents.largefilemanager.LargeFileManager")
        );
        assert_eq!(
            profile.kernel_manager().default_kernel_name.as_deref(),
            Some("python3")
        );
    }

    #[test]
    fn test_extract_reports_path() {
        let doc: Document = [Assignment::new("ServerApp.port", json!(70000), None)]
            .into_iter()
            .collect();
        let err = profile(&doc, ProfileKind::Lab).unwrap_err();
        assert!(err.to_string().contains("ServerApp.port"), "{err}");
    }
}
