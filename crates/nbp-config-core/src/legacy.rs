// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reader for line-oriented assignment profiles.
//!
//! Existing profiles are often written as one assignment per line on a
//! configuration object:
//!
//! ```text
//! c = get_config()
//! c.ServerApp.port = 8888
//! c.ServerApp.token = ''
//! c.LabServerApp.blacklist_uris = []
//! ```
//!
//! Only literal values are understood: quoted strings, integers, `True` /
//! `False`, `None` and bracketed lists. A list may continue over several lines
//! until its closing bracket. Anything else is a parse error.

use crate::document::{Assignment, Document};
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value as J;
use std::sync::OnceLock;

fn preamble() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^c\s*=\s*get_config\(\s*\)$").expect("valid preamble regex"))
}

fn assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^c\.([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$")
            .expect("valid assignment regex")
    })
}

/// Parse assignment-format text into a document
pub fn parse_assignments(src: &str) -> Result<Document> {
    let mut doc = Document::new();
    let mut lines = src.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() || preamble().is_match(line) {
            continue;
        }

        let caps = assignment()
            .captures(line)
            .ok_or_else(|| Error::parse(Some(line_no), format!("expected `c.Namespace.key = value`, found `{line}`")))?;
        let key = format!("{}.{}", &caps[1], &caps[2]);
        let mut literal = caps[3].trim().to_string();

        // Lists may span lines until the brackets balance
        while literal.starts_with('[') && bracket_depth(&literal) > 0 {
            let (_, next) = lines
                .next()
                .ok_or_else(|| Error::parse(Some(line_no), format!("unterminated list for '{key}'")))?;
            literal.push(' ');
            literal.push_str(strip_comment(next).trim());
        }

        let value = parse_literal(&literal)
            .map_err(|message| Error::parse(Some(line_no), format!("{key}: {message}")))?;
        doc.push(Assignment::new(key, value, Some(line_no)))?;
    }

    Ok(doc)
}

/// Drop a trailing `#` comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        match (quote, ch) {
            (Some(_), '\\') if !escaped => {
                escaped = true;
                continue;
            }
            (Some(q), c) if c == q && !escaped => quote = None,
            (None, '\'' | '"') => quote = Some(ch),
            (None, '#') => return &line[..i],
            _ => {}
        }
        escaped = false;
    }
    line
}

fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        match (quote, ch) {
            (Some(_), '\\') if !escaped => {
                escaped = true;
                continue;
            }
            (Some(q), c) if c == q && !escaped => quote = None,
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth -= 1,
            _ => {}
        }
        escaped = false;
    }
    depth
}

fn parse_literal(text: &str) -> std::result::Result<J, String> {
    let text = text.trim();
    match text {
        "True" => return Ok(J::Bool(true)),
        "False" => return Ok(J::Bool(false)),
        "None" => return Ok(J::Null),
        _ => {}
    }

    if text.starts_with('\'') || text.starts_with('"') {
        let (s, rest) = parse_string(text)?;
        if !rest.trim().is_empty() {
            return Err(format!("unexpected text after string: `{}`", rest.trim()));
        }
        return Ok(J::String(s));
    }

    if let Some(inner) = text.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| format!("malformed list `{text}`"))?;
        return parse_list(inner).map(J::Array);
    }

    let digits = text.replace('_', "");
    digits
        .parse::<i64>()
        .map(J::from)
        .map_err(|_| format!("unsupported value `{text}`"))
}

/// Parse a quoted string at the start of `text`; returns the string and the rest
fn parse_string(text: &str) -> std::result::Result<(String, &str), String> {
    let mut chars = text.char_indices().peekable();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err("expected a quoted string".to_string()),
    };

    let mut out = String::new();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                let (_, esc) = chars.next().ok_or("unterminated escape")?;
                match esc {
                    '\\' | '\'' | '"' => out.push(esc),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'a' => out.push('\u{07}'),
                    'b' => out.push('\u{08}'),
                    'f' => out.push('\u{0c}'),
                    'v' => out.push('\u{0b}'),
                    '\n' => {}
                    '0'..='7' => {
                        let mut code = esc as u32 - '0' as u32;
                        for _ in 0..2 {
                            match chars.peek() {
                                Some(&(_, d @ '0'..='7')) => {
                                    code = code * 8 + (d as u32 - '0' as u32);
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        out.push(char::from_u32(code).ok_or("invalid octal escape")?);
                    }
                    'x' => out.push(hex_escape(&mut chars, esc, 2)?),
                    'u' => out.push(hex_escape(&mut chars, esc, 4)?),
                    'U' => out.push(hex_escape(&mut chars, esc, 8)?),
                    'N' => return Err("named unicode escapes are not supported".to_string()),
                    // Unrecognized escapes keep their backslash
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            c if c == quote => return Ok((out, &text[i + c.len_utf8()..])),
            c => out.push(c),
        }
    }
    Err("unterminated string".to_string())
}

/// Decode the `len` hex digits of a `\x`, `\u` or `\U` escape
fn hex_escape(
    chars: &mut impl Iterator<Item = (usize, char)>,
    esc: char,
    len: usize,
) -> std::result::Result<char, String> {
    let digits: String = chars.take(len).map(|(_, c)| c).collect();
    if digits.chars().count() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("truncated \\{esc} escape"));
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid \\{esc} escape `{digits}`"))
}

fn parse_list(inner: &str) -> std::result::Result<Vec<J>, String> {
    let mut items = Vec::new();
    let mut rest = inner.trim();
    while !rest.is_empty() {
        let value = if rest.starts_with('\'') || rest.starts_with('"') {
            let (s, tail) = parse_string(rest)?;
            rest = tail.trim_start();
            J::String(s)
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            let value = parse_literal(&rest[..end])?;
            rest = rest[end..].trim_start();
            value
        };
        items.push(value);

        match rest.strip_prefix(',') {
            Some(tail) => rest = tail.trim_start(),
            None if rest.is_empty() => {}
            None => return Err(format!("expected `,` in list, found `{rest}`")),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Shape;
    use serde_json::json;

    #[test]
    fn test_parses_profile_lines() {
        let doc = parse_assignments(
            r#"# Jupyter Lab Configuration
c = get_config()

# Server settings
c.ServerApp.ip = '127.0.0.1'
c.ServerApp.port = 8888
c.ServerApp.open_browser = False
c.ServerApp.token = ''
c.ServerApp.allow_origin = '*'
c.LabServerApp.blacklist_uris = []
"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 6);
        assert_eq!(doc.get("ServerApp.ip").unwrap().value, json!("127.0.0.1"));
        assert_eq!(doc.get("ServerApp.port").unwrap().line, Some(6));
        assert_eq!(doc.get("ServerApp.open_browser").unwrap().value, json!(false));
        assert_eq!(doc.get("ServerApp.token").unwrap().value, json!(""));
        assert_eq!(doc.get("LabServerApp.blacklist_uris").unwrap().shape, Shape::Array);
    }

    #[test]
    fn test_comment_inside_string_is_kept() {
        let doc = parse_assignments("c.ServerApp.password = 'a#b'  # secret\n").unwrap();
        assert_eq!(doc.get("ServerApp.password").unwrap().value, json!("a#b"));
    }

    #[test]
    fn test_multiline_list() {
        let doc = parse_assignments(
            "c.LabServerApp.whitelist_uris = [\n    'https://a.example/*',  # first\n    \"https://b.example/*\",\n]\n",
        )
        .unwrap();
        assert_eq!(
            doc.get("LabServerApp.whitelist_uris").unwrap().value,
            json!(["https://a.example/*", "https://b.example/*"])
        );
    }

    #[test]
    fn test_escapes_and_none() {
        let doc = parse_assignments("c.A.b = 'it\\'s'\nc.A.c = None\n").unwrap();
        assert_eq!(doc.get("A.b").unwrap().value, json!("it's"));
        assert_eq!(doc.get("A.c").unwrap().shape, Shape::None);
    }

    #[test]
    fn test_numeric_escapes_decode_to_code_points() {
        let doc = parse_assignments(
            "c.A.b = '\\x41\\u00e9\\U0001F600\\101'\nc.A.c = 'C:\\dir\\new'\n",
        )
        .unwrap();
        assert_eq!(doc.get("A.b").unwrap().value, json!("A\u{e9}\u{1F600}A"));
        assert_eq!(doc.get("A.c").unwrap().value, json!("C:\\dir\nnew"));
    }

    #[test]
    fn test_bad_escapes_are_parse_errors() {
        for (src, needle) in [
            ("c.A.b = '\\x4'\n", "truncated \\x escape"),
            ("c.A.b = '\\uD800'\n", "invalid \\u escape"),
            ("c.A.b = '\\N{DASH}'\n", "named unicode escapes"),
        ] {
            match parse_assignments(src).unwrap_err() {
                Error::Parse { line, message } => {
                    assert_eq!(line, Some(1));
                    assert!(message.contains(needle), "{message}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_expressions() {
        let err = parse_assignments("c = get_config()\nc.ServerApp.port = 8000 + 1\n").unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("ServerApp.port"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_assignment_lines() {
        let err = parse_assignments("import os\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: Some(1), .. }));
    }

    #[test]
    fn test_unterminated_list() {
        let err = parse_assignments("c.LabServerApp.blacklist_uris = [\n'a',\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_duplicate_assignment() {
        let err = parse_assignments("c.ServerApp.port = 1\nc.ServerApp.port = 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: Some(2), .. }));
    }
}
