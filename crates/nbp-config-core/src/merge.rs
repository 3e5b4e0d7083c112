// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Merging of profile layers

use crate::document::Document;
use serde_json::Value as J;

/// Overlay `layer` onto `base`.
///
/// Keys are replaced one by one; a list assigned in `layer` replaces the list
/// in `base` wholesale rather than being concatenated.
pub fn overlay(base: &mut Document, layer: Document) {
    for assignment in layer.iter() {
        base.set(assignment.clone());
    }
}

/// Insert a value at a dotted path in JSON
pub fn insert_dotted(root: &mut J, dotted: &str, v: J) {
    let mut parts: Vec<&str> = dotted.split('.').collect();
    let Some(last) = parts.pop() else {
        return;
    };

    let mut cur = root;
    for p in parts {
        if !cur.is_object() {
            *cur = J::Object(Default::default());
        }
        let J::Object(map) = cur else {
            return;
        };
        cur = map.entry(p).or_insert_with(|| J::Object(Default::default()));
    }

    match cur {
        J::Object(map) => {
            map.insert(last.into(), v);
        }
        other => {
            let mut map = serde_json::Map::new();
            map.insert(last.to_string(), v);
            *other = J::Object(map);
        }
    }
}
