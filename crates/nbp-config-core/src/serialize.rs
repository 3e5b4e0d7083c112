// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Writing profiles back to the file format

use crate::error::Result;
use crate::schema::{self, Section};
use nbp_config_types::{Profile, ProfileKind};
use std::fmt::Write;

/// Serialize `profile` as TOML dotted assignments.
///
/// Only options that are set are written, grouped by section in table order,
/// so loading the output yields an identical profile.
pub fn to_toml(profile: &Profile) -> Result<String> {
    let kind = profile.kind();
    let json = serde_json::to_value(profile)?;

    let mut out = String::new();
    let title = match kind {
        ProfileKind::Lab => "Jupyter Lab",
        ProfileKind::Notebook => "Jupyter Notebook",
    };
    let _ = writeln!(out, "# {title} configuration profile");

    let mut current: Option<Section> = None;
    for spec in schema::options_for(kind) {
        let Some(value) = json
            .get(spec.section.namespace(kind))
            .and_then(|section| section.get(spec.name))
        else {
            continue;
        };
        if current != Some(spec.section) {
            let _ = write!(out, "\n# {}\n", spec.section.title());
            current = Some(spec.section);
        }
        let literal = toml::Value::try_from(value)?;
        let _ = writeln!(out, "{} = {}", spec.key(kind), literal);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbp_config_types::{LabProfile, NotebookProfile};

    #[test]
    fn test_writes_only_set_options() {
        let mut lab = LabProfile::default();
        lab.server_app.port = Some(8888);
        lab.server_app.token = Some(String::new());
        lab.lab_server_app.blacklist_uris = Some(vec![]);

        let text = to_toml(&Profile::Lab(lab)).unwrap();
        assert_eq!(
            text,
            "# Jupyter Lab configuration profile\n\
             \n# Server settings\n\
             ServerApp.port = 8888\n\
             ServerApp.token = \"\"\n\
             \n# Extension settings\n\
             LabServerApp.blacklist_uris = []\n"
        );
    }

    #[test]
    fn test_empty_profile_has_only_header() {
        let text = to_toml(&Profile::Notebook(NotebookProfile::default())).unwrap();
        assert_eq!(text, "# Jupyter Notebook configuration profile\n");
    }

    #[test]
    fn test_strings_are_escaped() {
        let mut nb = NotebookProfile::default();
        nb.notebook_app.server.password = Some("qu\"ote\\".into());
        let text = to_toml(&Profile::Notebook(nb.clone())).unwrap();

        let reparsed: NotebookProfile = toml::from_str(&text).unwrap();
        assert_eq!(reparsed, nb);
    }
}
