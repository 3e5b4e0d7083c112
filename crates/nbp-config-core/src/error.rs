// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error and violation types for profile loading

use nbp_config_types::Profile;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for profile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a profile operation
#[derive(Debug, Error)]
pub enum Error {
    #[error("reading profile {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", parse_message(.line, .message))]
    Parse { line: Option<usize>, message: String },

    #[error("unknown option: {key}")]
    UnknownOption { key: String },

    #[error("{}", kind_message(.hint))]
    AmbiguousKind { hint: Option<String> },

    #[error("{0}")]
    Rejected(Box<Rejection>),

    #[error("profile extraction failed: {0}")]
    Extract(String),

    #[error("profile schema failed to compile: {0}")]
    Schema(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_message(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("parse error at line {line}: {message}"),
        None => format!("parse error: {message}"),
    }
}

fn kind_message(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!("cannot infer profile kind for {hint}; specify it explicitly"),
        None => "cannot infer profile kind; specify it explicitly".to_string(),
    }
}

impl Error {
    pub(crate) fn parse(line: Option<usize>, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Violations carried by a rejected profile, empty for other errors
    pub fn violations(&self) -> &[Violation] {
        match self {
            Error::Rejected(rejection) => &rejection.violations,
            _ => &[],
        }
    }
}

/// Whether a violation blocks profile construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The value does not have the type or range the option requires
    TypeMismatch { expected: String, found: String },
    /// The key is not part of the schema for this profile kind (strict mode)
    UnknownOption,
    /// Accepted, but exposes the server without authentication
    InsecureConfiguration { reason: String },
    /// Accepted, but the option has been renamed
    DeprecatedOption { replacement: String },
}

/// A single finding about one option of a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted option name
    pub key: String,
    /// 1-based source line, when the option came from a file
    pub line: Option<usize>,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn severity(&self) -> Severity {
        match self.kind {
            ViolationKind::TypeMismatch { .. } | ViolationKind::UnknownOption => Severity::Fatal,
            ViolationKind::InsecureConfiguration { .. }
            | ViolationKind::DeprecatedOption { .. } => Severity::Warning,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.key)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        match &self.kind {
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, ": expected {expected}, found {found}")
            }
            ViolationKind::UnknownOption => write!(f, ": unknown option"),
            ViolationKind::InsecureConfiguration { reason } => {
                write!(f, ": insecure configuration: {reason}")
            }
            ViolationKind::DeprecatedOption { replacement } => {
                write!(f, ": deprecated, use {replacement}")
            }
        }
    }
}

/// A profile that failed to construct.
///
/// Carries every violation found (fatal and advisory) and a fallback profile
/// in which each failing option is left unset, so it resolves to its default.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub violations: Vec<Violation>,
    pub fallback: Profile,
    /// Unknown keys dropped in permissive mode
    pub ignored: Vec<String>,
}

impl Rejection {
    pub fn fatal(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_fatal())
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fatal: Vec<String> = self.fatal().map(|v| v.to_string()).collect();
        write!(
            f,
            "profile rejected with {} error(s):\n  - {}",
            fatal.len(),
            fatal.join("\n  - ")
        )
    }
}
