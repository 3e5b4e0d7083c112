// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Parsed but not yet validated profile contents

use crate::error::{Error, Result};
use crate::merge::insert_dotted;
use nbp_config_types::{Profile, ProfileKind};
use serde_json::Value as J;
use std::fmt;

/// Literal type of an assigned value as written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Table,
    Datetime,
    None,
}

impl Shape {
    pub fn of_json(value: &J) -> Self {
        match value {
            J::Null => Shape::None,
            J::Bool(_) => Shape::Boolean,
            J::Number(n) if n.is_i64() || n.is_u64() => Shape::Integer,
            J::Number(_) => Shape::Float,
            J::String(_) => Shape::String,
            J::Array(_) => Shape::Array,
            J::Object(_) => Shape::Table,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::String => "string",
            Shape::Integer => "integer",
            Shape::Float => "float",
            Shape::Boolean => "boolean",
            Shape::Array => "array",
            Shape::Table => "table",
            Shape::Datetime => "datetime",
            Shape::None => "none",
        };
        f.write_str(name)
    }
}

/// One `key = value` assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Dotted option name as written
    pub key: String,
    pub value: J,
    pub shape: Shape,
    /// 1-based source line
    pub line: Option<usize>,
}

impl Assignment {
    pub fn new(key: impl Into<String>, value: J, line: Option<usize>) -> Self {
        let shape = Shape::of_json(&value);
        Self {
            key: key.into(),
            value,
            shape,
            line,
        }
    }

    /// Human-readable description of the value for diagnostics
    pub fn describe(&self) -> String {
        match (&self.shape, &self.value) {
            (Shape::Table | Shape::Datetime | Shape::None, _) => self.shape.to_string(),
            (_, value) => format!("{} {}", self.shape, value),
        }
    }
}

/// Ordered set of assignments with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    assignments: Vec<Assignment>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an assignment. A key may be assigned only once.
    pub fn push(&mut self, assignment: Assignment) -> Result<()> {
        if let Some(previous) = self.get(&assignment.key) {
            let first = previous.line.map(|l| format!(" (first set on line {l})")).unwrap_or_default();
            return Err(Error::parse(
                assignment.line,
                format!("duplicate option '{}'{}", assignment.key, first),
            ));
        }
        self.assignments.push(assignment);
        Ok(())
    }

    /// Insert or replace an assignment, keeping the original position when replacing
    pub fn set(&mut self, assignment: Assignment) {
        match self.assignments.iter_mut().find(|a| a.key == assignment.key) {
            Some(slot) => *slot = assignment,
            None => self.assignments.push(assignment),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.key == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Assignment> {
        let idx = self.assignments.iter().position(|a| a.key == key)?;
        Some(self.assignments.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|a| a.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Nested JSON object keyed by namespace, the shape the typed profile structs expect
    pub fn to_json(&self) -> J {
        let mut root = serde_json::json!({});
        for a in &self.assignments {
            insert_dotted(&mut root, &a.key, a.value.clone());
        }
        root
    }

    /// Flatten a constructed profile back into assignments, one per set option
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        let json = serde_json::to_value(profile)?;
        let mut doc = Document::new();
        if let J::Object(sections) = json {
            for (namespace, fields) in sections {
                if let J::Object(fields) = fields {
                    for (name, value) in fields {
                        doc.set(Assignment::new(format!("{namespace}.{name}"), value, None));
                    }
                }
            }
        }
        Ok(doc)
    }

    /// Guess the profile kind from the namespaces present
    pub fn infer_kind(&self) -> Option<ProfileKind> {
        let has = |ns: &str| {
            self.keys()
                .any(|k| k.split_once('.').map(|(n, _)| n == ns).unwrap_or(false))
        };
        let notebook = has("NotebookApp");
        let lab = has("ServerApp") || has("LabApp") || has("LabServerApp");
        match (lab, notebook) {
            (true, false) => Some(ProfileKind::Lab),
            (false, true) => Some(ProfileKind::Notebook),
            _ => None,
        }
    }
}

impl FromIterator<Assignment> for Document {
    fn from_iter<I: IntoIterator<Item = Assignment>>(iter: I) -> Self {
        let mut doc = Document::new();
        for a in iter {
            doc.set(a);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_key_is_parse_error() {
        let mut doc = Document::new();
        doc.push(Assignment::new("ServerApp.port", json!(1), Some(1))).unwrap();
        let err = doc
            .push(Assignment::new("ServerApp.port", json!(2), Some(4)))
            .unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, Some(4));
                assert!(message.contains("line 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_to_json_nests_by_namespace() {
        let doc: Document = [
            Assignment::new("ServerApp.port", json!(8888), None),
            Assignment::new("ServerApp.ip", json!("127.0.0.1"), None),
            Assignment::new("LabApp.collaborative", json!(true), None),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            doc.to_json(),
            json!({
                "ServerApp": {"port": 8888, "ip": "127.0.0.1"},
                "LabApp": {"collaborative": true}
            })
        );
    }

    #[test]
    fn test_infer_kind() {
        let lab: Document = [Assignment::new("LabApp.dev_mode", json!(false), None)]
            .into_iter()
            .collect();
        assert_eq!(lab.infer_kind(), Some(ProfileKind::Lab));

        let notebook: Document = [Assignment::new("NotebookApp.port", json!(1), None)]
            .into_iter()
            .collect();
        assert_eq!(notebook.infer_kind(), Some(ProfileKind::Notebook));

        let shared: Document = [Assignment::new("ContentsManager.allow_hidden", json!(true), None)]
            .into_iter()
            .collect();
        assert_eq!(shared.infer_kind(), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Assignment::new("k", json!("x"), None).describe(),
            "string \"x\""
        );
        assert_eq!(Assignment::new("k", json!(-1), None).describe(), "integer -1");
        assert_eq!(Assignment::new("k", json!({}), None).describe(), "table");
    }
}
