// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Type conformance and advisory checks.
//!
//! Value types, ranges and formats are checked against the JSON Schema derived
//! from the typed profile structs. The option table decides which keys exist,
//! which are deprecated and what the expected type is called in messages.

use crate::document::{Assignment, Document};
use crate::error::{Error, Result, Violation, ViolationKind};
use crate::extract;
use crate::loader::Strictness;
use crate::merge::insert_dotted;
use crate::schema::{self, OptionSpec, OptionValue, Section};
use jsonschema::{Draft, JSONSchema};
use nbp_config_types::server::ADDRESS_FORMAT;
use nbp_config_types::{Profile, ProfileKind};
use regex::Regex;
use serde_json::Value as J;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::OnceLock;

/// Outcome of checking a document against the option table
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Fatal and advisory findings, in document order, advisories last
    pub violations: Vec<Violation>,
    /// Keys that are not recognized for the profile kind
    pub unknown: Vec<String>,
}

impl Report {
    pub fn has_fatal(&self) -> bool {
        self.violations.iter().any(Violation::is_fatal)
    }
}

/// Check every assignment of `doc` for a profile of `kind`.
///
/// Unknown keys are always listed in [`Report::unknown`]; in strict mode they
/// are also reported as fatal violations.
pub fn check_document(doc: &Document, kind: ProfileKind, strictness: Strictness) -> Result<Report> {
    let mut report = Report::default();
    let mut known: Vec<(&'static OptionSpec, &Assignment)> = Vec::new();

    for assignment in doc.iter() {
        let spec = assignment
            .key
            .contains('.')
            .then(|| schema::lookup(kind, &assignment.key))
            .flatten();
        match spec {
            Some(spec) => known.push((spec, assignment)),
            None => {
                report.unknown.push(assignment.key.clone());
                if strictness == Strictness::Strict {
                    report.violations.push(Violation {
                        key: assignment.key.clone(),
                        line: assignment.line,
                        kind: ViolationKind::UnknownOption,
                    });
                }
            }
        }
    }

    let mut failing = schema_failures(kind, known.iter().map(|(_, a)| *a))?;
    let undeserializable = extraction_failures(
        kind,
        known.iter().map(|(_, a)| *a).filter(|a| !failing.contains(&a.key)),
    );
    failing.extend(undeserializable);

    let mut valid = Vec::new();
    for (spec, assignment) in known {
        if failing.contains(&assignment.key) {
            report.violations.push(Violation {
                key: assignment.key.clone(),
                line: assignment.line,
                kind: ViolationKind::TypeMismatch {
                    expected: spec.value_type.to_string(),
                    found: assignment.describe(),
                },
            });
        } else {
            valid.push((spec, assignment));
        }
    }

    report.violations.extend(advisories(kind, &valid));
    Ok(report)
}

/// Validate a constructed profile.
///
/// Typed profiles can still carry malformed strings (an unparsable address, a
/// bad class name), so the full check runs on the profile's assignments.
pub fn validate(profile: &Profile) -> Result<Vec<Violation>> {
    let doc = Document::from_profile(profile)?;
    Ok(check_document(&doc, profile.kind(), Strictness::Strict)?.violations)
}

/// Compiled schema validator for profiles of `kind`
fn validator(kind: ProfileKind) -> Result<&'static JSONSchema> {
    static LAB: OnceLock<std::result::Result<JSONSchema, String>> = OnceLock::new();
    static NOTEBOOK: OnceLock<std::result::Result<JSONSchema, String>> = OnceLock::new();

    let cell = match kind {
        ProfileKind::Lab => &LAB,
        ProfileKind::Notebook => &NOTEBOOK,
    };
    cell.get_or_init(|| {
        let schema = schema::json_schema(kind);
        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .with_format(ADDRESS_FORMAT, is_valid_address)
            .compile(&schema)
            .map_err(|e| e.to_string())
    })
    .as_ref()
    .map_err(|e| Error::Schema(e.clone()))
}

/// Keys whose values the schema rejects.
///
/// Every schema error points into the instance at `/Namespace/name/...`; the
/// first two segments name the option.
fn schema_failures<'a>(
    kind: ProfileKind,
    assignments: impl Iterator<Item = &'a Assignment>,
) -> Result<HashSet<String>> {
    let mut instance = J::Object(Default::default());
    for assignment in assignments {
        insert_dotted(&mut instance, &assignment.key, assignment.value.clone());
    }

    let mut failing = HashSet::new();
    if let Err(errors) = validator(kind)?.validate(&instance) {
        for error in errors {
            let pointer = error.instance_path.to_string();
            let mut segments = pointer.trim_start_matches('/').split('/');
            match (segments.next(), segments.next()) {
                (Some(namespace), Some(name)) if !namespace.is_empty() => {
                    failing.insert(format!("{namespace}.{name}"));
                }
                _ => tracing::debug!(%pointer, %error, "schema error outside any option"),
            }
        }
    }
    Ok(failing)
}

/// Keys the schema accepts but the typed structs cannot hold, such as a float
/// with an integral value where an integer is required
fn extraction_failures<'a>(
    kind: ProfileKind,
    assignments: impl Iterator<Item = &'a Assignment> + Clone,
) -> Vec<String> {
    let all: Document = assignments.clone().cloned().collect();
    if extract::profile(&all, kind).is_ok() {
        return Vec::new();
    }
    assignments
        .filter(|a| {
            let single: Document = std::iter::once((*a).clone()).collect();
            extract::profile(&single, kind).is_err()
        })
        .map(|a| a.key.clone())
        .collect()
}

fn advisories(kind: ProfileKind, valid: &[(&'static OptionSpec, &Assignment)]) -> Vec<Violation> {
    let mut out = Vec::new();

    for (spec, assignment) in valid {
        if let Some(replacement) = spec.deprecated_by {
            out.push(Violation {
                key: assignment.key.clone(),
                line: assignment.line,
                kind: ViolationKind::DeprecatedOption {
                    replacement: replacement.to_string(),
                },
            });
        }
    }

    let effective = |name: &str| -> Option<OptionValue> {
        valid
            .iter()
            .find(|(spec, _)| spec.section == Section::Server && spec.name == name)
            .and_then(|(_, a)| OptionValue::from_json(&a.value))
            .or_else(|| {
                schema::options_for(kind)
                    .find(|o| o.section == Section::Server && o.name == name)
                    .map(|o| o.default.to_value())
            })
    };

    let token = effective("token");
    let password = effective("password");
    let remote = effective("allow_remote_access").and_then(|v| v.as_bool());
    let ip = effective("ip");

    let unset = |v: &Option<OptionValue>| {
        v.as_ref()
            .and_then(OptionValue::as_str)
            .map(str::is_empty)
            .unwrap_or(true)
    };
    let no_auth = unset(&token) && unset(&password);
    let ip = ip.as_ref().and_then(|v| v.as_str()).unwrap_or_default();

    if no_auth && remote == Some(true) && !is_loopback(ip) {
        let key = format!("{}.allow_remote_access", kind.server_namespace());
        let line = valid
            .iter()
            .find(|(_, a)| a.key == key)
            .and_then(|(_, a)| a.line);
        let bind = if ip.is_empty() || ip == "*" {
            "all interfaces".to_string()
        } else {
            ip.to_string()
        };
        out.push(Violation {
            key,
            line,
            kind: ViolationKind::InsecureConfiguration {
                reason: format!(
                    "token and password are both empty while remote access is allowed on {bind}"
                ),
            },
        });
    }

    out
}

fn hostname() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*\.?$")
            .expect("valid hostname regex")
    })
}

/// IPv4/IPv6 literal, hostname, or empty / `*` meaning all interfaces
pub fn is_valid_address(s: &str) -> bool {
    if s.is_empty() || s == "*" || s.parse::<IpAddr>().is_ok() {
        return true;
    }
    // A name made only of numeric labels has to be an IPv4 literal
    let numeric = s
        .trim_end_matches('.')
        .split('.')
        .all(|label| !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()));
    s.len() <= 253 && !numeric && hostname().is_match(s)
}

/// Whether binding to `ip` only accepts loopback clients
pub fn is_loopback(ip: &str) -> bool {
    if ip.trim_end_matches('.').eq_ignore_ascii_case("localhost") {
        return true;
    }
    ip.parse::<IpAddr>().map(|a| a.is_loopback()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_toml;

    fn report(src: &str, strictness: Strictness) -> Report {
        check_document(&parse_toml(src).unwrap(), ProfileKind::Lab, strictness).unwrap()
    }

    #[test]
    fn test_addresses() {
        for ok in ["127.0.0.1", "0.0.0.0", "::1", "fe80::1", "localhost", "nb.example.org", "", "*"] {
            assert!(is_valid_address(ok), "{ok} should be valid");
        }
        for bad in ["999.1.1.1", "1.2.3", "-bad.example", "white space", "a..b"] {
            assert!(!is_valid_address(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_loopback() {
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("127.8.9.10"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("LocalHost"));
        assert!(!is_loopback("0.0.0.0"));
        assert!(!is_loopback(""));
        assert!(!is_loopback("nb.example.org"));
    }

    #[test]
    fn test_type_mismatch_carries_line_and_found_value() {
        let r = report("ServerApp.ip = \"127.0.0.1\"\nServerApp.port = \"8888\"\n", Strictness::Permissive);
        assert_eq!(r.violations.len(), 1);
        let v = &r.violations[0];
        assert_eq!(v.key, "ServerApp.port");
        assert_eq!(v.line, Some(2));
        assert_eq!(
            v.kind,
            ViolationKind::TypeMismatch {
                expected: "integer in 0..=65535".into(),
                found: "string \"8888\"".into()
            }
        );
    }

    #[test]
    fn test_refined_string_types() {
        let r = report(
            "ServerApp.ip = \"not an address\"\nMappingKernelManager.default_kernel_name = \"python 3\"\n",
            Strictness::Permissive,
        );
        let keys: Vec<&str> = r.violations.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["ServerApp.ip", "MappingKernelManager.default_kernel_name"]);
        assert!(r.has_fatal());

        let nb = check_document(
            &parse_toml("NotebookApp.contents_manager_class = \"not a class\"\n").unwrap(),
            ProfileKind::Notebook,
            Strictness::Permissive,
        )
        .unwrap();
        assert!(nb.has_fatal());
    }

    #[test]
    fn test_list_items_must_be_strings() {
        let r = report(
            "LabServerApp.blocked_extensions_uris = [\"a\", 1, false]\n",
            Strictness::Permissive,
        );
        assert_eq!(r.violations.len(), 1, "one violation per option: {:?}", r.violations);
        assert!(r.has_fatal());
    }

    #[test]
    fn test_schema_rejects_values_per_option() {
        let r = report(
            "ServerApp.port = -1\nServerApp.open_browser = \"yes\"\nServerApp.token = { a = 1 }\nServerApp.allow_origin = \"*\"\n",
            Strictness::Permissive,
        );
        let keys: Vec<(&str, Option<usize>)> =
            r.violations.iter().map(|v| (v.key.as_str(), v.line)).collect();
        assert_eq!(
            keys,
            vec![
                ("ServerApp.port", Some(1)),
                ("ServerApp.open_browser", Some(2)),
                ("ServerApp.token", Some(3)),
            ]
        );
        assert_eq!(
            r.violations[2].kind,
            ViolationKind::TypeMismatch {
                expected: "string".into(),
                found: "table".into()
            }
        );
    }

    #[test]
    fn test_integral_float_is_not_a_port() {
        let r = report("ServerApp.port = 8888.0\n", Strictness::Permissive);
        assert_eq!(r.violations.len(), 1);
        assert_eq!(
            r.violations[0].kind,
            ViolationKind::TypeMismatch {
                expected: "integer in 0..=65535".into(),
                found: "float 8888.0".into()
            }
        );
    }

    #[test]
    fn test_schema_carries_option_constraints() {
        let schema = schema::json_schema(ProfileKind::Notebook);
        let text = schema.to_string();
        assert!(text.contains(ADDRESS_FORMAT));
        assert!(text.contains("65535"));
        assert!(validator(ProfileKind::Notebook).is_ok());
        assert!(validator(ProfileKind::Lab).is_ok());
    }

    #[test]
    fn test_unknown_keys_by_strictness() {
        let permissive = report("foo_bar = 1\nServerApp.nope = true\n", Strictness::Permissive);
        assert_eq!(permissive.unknown, vec!["foo_bar", "ServerApp.nope"]);
        assert!(permissive.violations.is_empty());

        let strict = report("foo_bar = 1\n", Strictness::Strict);
        assert_eq!(strict.unknown, vec!["foo_bar"]);
        assert_eq!(strict.violations[0].kind, ViolationKind::UnknownOption);
        assert!(strict.has_fatal());
    }

    #[test]
    fn test_bare_names_are_not_accepted_in_files() {
        let r = report("port = 8888\n", Strictness::Permissive);
        assert_eq!(r.unknown, vec!["port"]);
    }

    #[test]
    fn test_insecure_warning_requires_all_conditions() {
        let base = "ServerApp.token = \"\"\nServerApp.password = \"\"\nServerApp.allow_remote_access = true\n";

        let exposed = report(&format!("{base}ServerApp.ip = \"0.0.0.0\"\n"), Strictness::Strict);
        let insecure: Vec<_> = exposed
            .violations
            .iter()
            .filter(|v| matches!(v.kind, ViolationKind::InsecureConfiguration { .. }))
            .collect();
        assert_eq!(insecure.len(), 1);
        assert_eq!(insecure[0].line, Some(3));
        assert!(!exposed.has_fatal());

        let loopback = report(&format!("{base}ServerApp.ip = \"127.0.0.1\"\n"), Strictness::Strict);
        assert!(loopback.violations.is_empty());

        let with_token = report(
            "ServerApp.token = \"s3cret\"\nServerApp.allow_remote_access = true\nServerApp.ip = \"0.0.0.0\"\n",
            Strictness::Strict,
        );
        assert!(with_token.violations.is_empty());

        // Default bind address is localhost
        let default_ip = report(base, Strictness::Strict);
        assert!(default_ip.violations.is_empty());
    }

    #[test]
    fn test_deprecated_names_are_advisory() {
        let r = report("LabServerApp.blacklist_uris = []\n", Strictness::Strict);
        assert_eq!(r.violations.len(), 1);
        assert!(!r.has_fatal());
        assert_eq!(
            r.violations[0].kind,
            ViolationKind::DeprecatedOption {
                replacement: "LabServerApp.blocked_extensions_uris".into()
            }
        );
    }

    #[test]
    fn test_validate_constructed_profile() {
        let mut profile = nbp_config_types::LabProfile::default();
        profile.server_app.ip = Some("bad address!".into());
        let violations = validate(&Profile::Lab(profile)).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].key, "ServerApp.ip");
        assert_eq!(violations[0].line, None);
    }
}
