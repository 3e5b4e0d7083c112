// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Read access to constructed profiles

use crate::error::{Error, Result};
use crate::schema::{self, OptionSpec, OptionValue};
use nbp_config_types::Profile;
use serde_json::Value as J;

/// One option of a profile with its resolved value
#[derive(Debug, Clone)]
pub struct Entry {
    pub spec: &'static OptionSpec,
    /// Dotted key within the profile's kind
    pub key: String,
    pub value: OptionValue,
    /// `true` when the option is unset and `value` is the built-in default
    pub is_default: bool,
}

/// Value of `key` in `profile`, or the documented default when unset.
///
/// `key` is a dotted `Namespace.name` or a bare `name`. Fails only for keys
/// that are not recognized for the profile's kind.
pub fn get(profile: &Profile, key: &str) -> Result<OptionValue> {
    let spec = schema::lookup(profile.kind(), key).ok_or_else(|| Error::UnknownOption {
        key: key.to_string(),
    })?;
    let json = serde_json::to_value(profile)?;
    Ok(resolve(&json, profile, spec).0)
}

/// Every recognized option of the profile's kind, in table order
pub fn entries(profile: &Profile) -> Result<Vec<Entry>> {
    let kind = profile.kind();
    let json = serde_json::to_value(profile)?;
    Ok(schema::options_for(kind)
        .map(|spec| {
            let (value, is_default) = resolve(&json, profile, spec);
            Entry {
                spec,
                key: spec.key(kind),
                value,
                is_default,
            }
        })
        .collect())
}

fn resolve(json: &J, profile: &Profile, spec: &OptionSpec) -> (OptionValue, bool) {
    json.get(spec.section.namespace(profile.kind()))
        .and_then(|section| section.get(spec.name))
        .and_then(OptionValue::from_json)
        .map(|v| (v, false))
        .unwrap_or_else(|| (spec.default.to_value(), true))
}
