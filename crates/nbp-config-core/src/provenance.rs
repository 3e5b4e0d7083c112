// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Provenance tracking for layered profiles

use crate::document::Document;
use serde_json::Value as J;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Layer precedence order, lowest first
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Scope {
    System,
    User,
    Explicit,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::System => write!(f, "system"),
            Scope::User => write!(f, "user"),
            Scope::Explicit => write!(f, "explicit"),
        }
    }
}

/// Where a winning value was assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scope: Scope,
    pub path: PathBuf,
    pub line: Option<usize>,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.scope, self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// Provenance information for profile values
#[derive(Default, Clone, Debug)]
pub struct Provenance {
    /// Maps dotted keys to the layer that set the final value
    pub winner: BTreeMap<String, Origin>,
    /// Maps dotted keys to every value assigned, lowest layer first
    pub changes: BTreeMap<String, Vec<(Scope, J)>>,
}

impl Provenance {
    /// Record every assignment of a layer; later layers win
    pub fn record_layer(&mut self, doc: &Document, scope: Scope, path: &Path) {
        for a in doc.iter() {
            self.winner.insert(
                a.key.clone(),
                Origin {
                    scope,
                    path: path.to_path_buf(),
                    line: a.line,
                },
            );
            self.changes
                .entry(a.key.clone())
                .or_default()
                .push((scope, a.value.clone()));
        }
    }

    pub fn origin(&self, key: &str) -> Option<&Origin> {
        self.winner.get(key)
    }

    /// Every value assigned to `key`, lowest layer first
    pub fn history(&self, key: &str) -> &[(Scope, J)] {
        self.changes.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Assignment;
    use serde_json::json;

    #[test]
    fn test_later_layer_wins() {
        let system: Document = [Assignment::new("ServerApp.port", json!(8000), Some(3))]
            .into_iter()
            .collect();
        let user: Document = [Assignment::new("ServerApp.port", json!(9000), Some(1))]
            .into_iter()
            .collect();

        let mut prov = Provenance::default();
        prov.record_layer(&system, Scope::System, Path::new("/etc/jupyter/a.toml"));
        prov.record_layer(&user, Scope::User, Path::new("/home/u/.jupyter/a.toml"));

        let origin = prov.origin("ServerApp.port").unwrap();
        assert_eq!(origin.scope, Scope::User);
        assert_eq!(origin.to_string(), "user /home/u/.jupyter/a.toml:1");
        assert_eq!(
            prov.history("ServerApp.port"),
            [(Scope::System, json!(8000)), (Scope::User, json!(9000))]
        );
        assert!(prov.history("ServerApp.ip").is_empty());
    }
}
