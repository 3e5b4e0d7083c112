// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Profile loading: parse, resolve the kind, validate, extract

use crate::document::{Assignment, Document, Shape};
use crate::error::{Error, Rejection, Result, Violation};
use crate::{extract, legacy, validate};
use nbp_config_types::{Profile, ProfileKind};
use serde_json::Value as J;
use std::collections::HashMap;
use std::path::Path;

/// How keys that are not in the option table are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Unknown keys are dropped with a warning
    #[default]
    Permissive,
    /// Unknown keys reject the profile
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Profile kind; inferred from the contents or file name when `None`
    pub kind: Option<ProfileKind>,
    pub strictness: Strictness,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ProfileKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A successfully constructed profile with its advisories
#[derive(Debug, Clone)]
pub struct Loaded {
    pub profile: Profile,
    /// Non-fatal findings (insecure combinations, deprecated names)
    pub warnings: Vec<Violation>,
    /// Unknown keys dropped in permissive mode
    pub ignored: Vec<String>,
}

/// Source format of a profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TOML with dotted `Namespace.key = value` assignments
    Toml,
    /// Line-oriented `c.Namespace.key = literal` assignments
    Assignments,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Format::Assignments,
            _ => Format::Toml,
        }
    }
}

/// Parse TOML profile text into a document.
///
/// Assignments keep the order they appear in the file, whatever table or
/// dotted form they were written in.
pub fn parse_toml(src: &str) -> Result<Document> {
    let table: toml::Table = toml::from_str(src).map_err(|e| {
        let line = e.span().map(|span| line_of_offset(src, span.start));
        Error::parse(line, e.message().trim())
    })?;

    let lines = key_lines(src);
    let mut assignments = Vec::new();
    for (namespace, value) in table {
        match value {
            toml::Value::Table(fields) => {
                for (name, value) in fields {
                    let key = format!("{namespace}.{name}");
                    assignments.push(toml_assignment(&key, value, &lines));
                }
            }
            other => assignments.push(toml_assignment(&namespace, other, &lines)),
        }
    }
    assignments.sort_by_key(|a| a.line.unwrap_or(usize::MAX));

    let mut doc = Document::new();
    for assignment in assignments {
        doc.push(assignment)?;
    }
    Ok(doc)
}

/// Parse profile text in the given format
pub fn parse_str(src: &str, format: Format) -> Result<Document> {
    match format {
        Format::Toml => parse_toml(src),
        Format::Assignments => legacy::parse_assignments(src),
    }
}

/// Read and parse a profile file; the format follows the file extension
pub fn read_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "read profile");
    parse_str(&content, Format::from_path(path))
}

/// Load a TOML profile from a string
pub fn load_str(src: &str, options: &LoadOptions) -> Result<Loaded> {
    load_document(parse_toml(src)?, options, None)
}

/// Load a profile file
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Loaded> {
    let doc = read_document(path)?;
    load_document(doc, options, Some(path))
}

/// Validate a parsed document and construct the typed profile.
///
/// Either every recognized key is valid and a profile is returned, or the
/// whole profile is rejected with the full violation list.
pub fn load_document(doc: Document, options: &LoadOptions, path: Option<&Path>) -> Result<Loaded> {
    let kind = resolve_kind(&doc, options.kind, path)?;
    let report = validate::check_document(&doc, kind, options.strictness)?;
    tracing::debug!(
        %kind,
        options = doc.len(),
        violations = report.violations.len(),
        "validated profile"
    );

    let mut accepted = doc;
    for key in &report.unknown {
        accepted.remove(key);
        if options.strictness == Strictness::Permissive {
            tracing::warn!(%key, "ignoring unknown option");
        }
    }

    if report.has_fatal() {
        for v in report.violations.iter().filter(|v| v.is_fatal()) {
            accepted.remove(&v.key);
        }
        let fallback =
            extract::profile(&accepted, kind).unwrap_or_else(|_| Profile::empty(kind));
        return Err(Error::Rejected(Box::new(Rejection {
            violations: report.violations,
            fallback,
            ignored: ignored_keys(report.unknown, options.strictness),
        })));
    }

    for warning in &report.violations {
        tracing::warn!(%warning, "profile advisory");
    }

    Ok(Loaded {
        profile: extract::profile(&accepted, kind)?,
        warnings: report.violations,
        ignored: ignored_keys(report.unknown, options.strictness),
    })
}

/// Unknown keys are only dropped silently in permissive mode; strict mode
/// reports them as violations instead
fn ignored_keys(unknown: Vec<String>, strictness: Strictness) -> Vec<String> {
    match strictness {
        Strictness::Permissive => unknown,
        Strictness::Strict => Vec::new(),
    }
}

/// Pick the profile kind: explicit, then from namespaces, then from the file name
pub fn resolve_kind(
    doc: &Document,
    explicit: Option<ProfileKind>,
    path: Option<&Path>,
) -> Result<ProfileKind> {
    if let Some(kind) = explicit.or_else(|| doc.infer_kind()) {
        return Ok(kind);
    }
    let name = path
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.starts_with("jupyter_notebook_config") {
        Ok(ProfileKind::Notebook)
    } else if name.starts_with("jupyter_lab_config") || name.starts_with("jupyter_server_config")
    {
        Ok(ProfileKind::Lab)
    } else {
        Err(Error::AmbiguousKind {
            hint: path.map(|p| p.display().to_string()),
        })
    }
}

fn toml_assignment(key: &str, value: toml::Value, lines: &HashMap<String, usize>) -> Assignment {
    let shape = match &value {
        toml::Value::Datetime(_) => Shape::Datetime,
        toml::Value::Table(_) => Shape::Table,
        _ => Shape::None,
    };
    let mut assignment = Assignment::new(key, toml_to_json(value), lines.get(key).copied());
    if shape != Shape::None {
        assignment.shape = shape;
    }
    assignment
}

/// Key of the marker object a TOML datetime becomes in JSON. No option takes
/// a datetime, so the marker fails every type check.
pub const DATETIME_MARKER: &str = "$__toml_private_datetime";

/// Convert a TOML value to JSON
fn toml_to_json(value: toml::Value) -> J {
    match value {
        toml::Value::String(s) => J::String(s),
        toml::Value::Integer(i) => J::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map(J::Number).unwrap_or(J::Null),
        toml::Value::Boolean(b) => J::Bool(b),
        toml::Value::Datetime(dt) => {
            let mut marker = serde_json::Map::new();
            marker.insert(DATETIME_MARKER.to_string(), J::String(dt.to_string()));
            J::Object(marker)
        }
        toml::Value::Array(items) => J::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => J::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn line_of_offset(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Map each dotted key to the 1-based line of its key token.
///
/// Lines come from the spans of the parsed document, so text inside
/// multi-line strings and arrays never counts as an assignment.
fn key_lines(src: &str) -> HashMap<String, usize> {
    let mut out = HashMap::new();
    let doc = match toml_edit::ImDocument::parse(src) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "no key spans for profile");
            return out;
        }
    };
    let line_of = |key: &toml_edit::Key| key.span().map(|span| line_of_offset(src, span.start));

    for (namespace, item) in doc.iter() {
        match item.as_table_like() {
            Some(fields) => {
                for (name, _) in fields.iter() {
                    if let Some(line) = fields.get_key_value(name).and_then(|(k, _)| line_of(k)) {
                        out.insert(format!("{namespace}.{name}"), line);
                    }
                }
            }
            None => {
                if let Some(line) = doc.get_key_value(namespace).and_then(|(k, _)| line_of(k)) {
                    out.insert(namespace.to_string(), line);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_toml_dotted_assignments() {
        let doc = parse_toml(
            r#"
# comment
ServerApp.ip = "127.0.0.1"
ServerApp.port = 8888   # trailing comment
LabServerApp.blacklist_uris = []
"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 3);
        let port = doc.get("ServerApp.port").unwrap();
        assert_eq!(port.value, json!(8888));
        assert_eq!(port.shape, Shape::Integer);
        assert_eq!(port.line, Some(4));
        assert_eq!(doc.get("ServerApp.ip").unwrap().line, Some(3));
    }

    #[test]
    fn test_parse_toml_tables_track_lines() {
        let doc = parse_toml("[NotebookApp]\nport = 9000\n\n[ContentsManager]\nallow_hidden = true\n")
            .unwrap();
        assert_eq!(doc.get("NotebookApp.port").unwrap().line, Some(2));
        assert_eq!(doc.get("ContentsManager.allow_hidden").unwrap().line, Some(5));
    }

    #[test]
    fn test_parse_toml_keeps_file_order_across_namespaces() {
        let doc = parse_toml(
            "ServerApp.ip = \"127.0.0.1\"\nMappingKernelManager.default_kernel_name = \"python3\"\nServerApp.port = 8888\nContentsManager.allow_hidden = true\n",
        )
        .unwrap();
        let keys: Vec<&str> = doc.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "ServerApp.ip",
                "MappingKernelManager.default_kernel_name",
                "ServerApp.port",
                "ContentsManager.allow_hidden",
            ]
        );
    }

    #[test]
    fn test_key_lines_skip_multiline_values() {
        let src = r#"ServerApp.token = """
ServerApp.port = 1
"""
LabServerApp.blocked_extensions_uris = [
  "ServerApp.ip = x",
]
ServerApp.ip = 'a'
ServerApp.port = 8888
"#;
        let doc = parse_toml(src).unwrap();
        assert_eq!(doc.get("ServerApp.token").unwrap().line, Some(1));
        assert_eq!(doc.get("LabServerApp.blocked_extensions_uris").unwrap().line, Some(4));
        assert_eq!(doc.get("ServerApp.ip").unwrap().line, Some(7));
        assert_eq!(doc.get("ServerApp.port").unwrap().line, Some(8));
    }

    #[test]
    fn test_key_lines_for_inline_tables() {
        let doc = parse_toml("\nServerApp = { ip = \"::1\", port = 9000 }\n").unwrap();
        assert_eq!(doc.get("ServerApp.port").unwrap().line, Some(2));
    }

    #[test]
    fn test_rejection_keeps_ignored_keys() {
        let err = load_str(
            "foo_bar = 1\nServerApp.port = 70000\n",
            &LoadOptions::default().with_kind(ProfileKind::Lab),
        )
        .unwrap_err();
        let Error::Rejected(rejection) = err else {
            panic!("expected rejection, got {err:?}");
        };
        assert_eq!(rejection.ignored, vec!["foo_bar"]);
        assert_eq!(rejection.fatal().count(), 1);

        let strict = load_str(
            "foo_bar = 1\nServerApp.port = 70000\n",
            &LoadOptions::strict().with_kind(ProfileKind::Lab),
        )
        .unwrap_err();
        let Error::Rejected(rejection) = strict else {
            panic!("expected rejection");
        };
        assert!(rejection.ignored.is_empty());
        assert_eq!(rejection.fatal().count(), 2);
    }

    #[test]
    fn test_datetime_is_a_type_mismatch() {
        let err = load_str(
            "ServerApp.token = 1979-05-27T07:32:00Z\n",
            &LoadOptions::default(),
        )
        .unwrap_err();
        let violation = &err.violations()[0];
        assert_eq!(violation.key, "ServerApp.token");
        assert!(
            matches!(&violation.kind, crate::ViolationKind::TypeMismatch { found, .. } if found == "datetime"),
            "{violation}"
        );
    }

    #[test]
    fn test_parse_toml_bare_and_nested_keys() {
        let doc = parse_toml("foo_bar = 1\nA.B.c = 2\n").unwrap();
        assert_eq!(doc.get("foo_bar").unwrap().value, json!(1));
        let nested = doc.get("A.B").unwrap();
        assert_eq!(nested.shape, Shape::Table);
    }

    #[test]
    fn test_parse_toml_datetime_shape() {
        let doc = parse_toml("ServerApp.token = 1979-05-27T07:32:00Z\n").unwrap();
        assert_eq!(doc.get("ServerApp.token").unwrap().shape, Shape::Datetime);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_toml("ServerApp.ip = \"a\"\nServerApp.port = = 1\n").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_key_is_parse_error() {
        let err = parse_toml("ServerApp.port = 1\nServerApp.port = 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_resolve_kind_from_file_name() {
        let doc = parse_toml("ContentsManager.allow_hidden = true\n").unwrap();
        let notebook = Path::new("/x/jupyter_notebook_config.toml");
        assert_eq!(
            resolve_kind(&doc, None, Some(notebook)).unwrap(),
            ProfileKind::Notebook
        );
        assert!(matches!(
            resolve_kind(&doc, None, Some(Path::new("/x/other.toml"))),
            Err(Error::AmbiguousKind { .. })
        ));
        assert_eq!(
            resolve_kind(&doc, Some(ProfileKind::Lab), None).unwrap(),
            ProfileKind::Lab
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            Format::from_path(Path::new("jupyter_lab_config.py")),
            Format::Assignments
        );
        assert_eq!(Format::from_path(Path::new("lab.toml")), Format::Toml);
    }
}
