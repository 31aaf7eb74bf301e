use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use super::{ColorMapping, ValidationError, flatten_roles, is_color_role};
use crate::constants::palette::{HEX_COLOR_PATTERN, INDEXED_COLORS, REQUIRED_SPECIAL};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEX_COLOR_PATTERN).expect("hex color pattern compiles"));

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// background, foreground, cursor, color0..color15
pub fn required_roles() -> BTreeSet<String> {
    REQUIRED_SPECIAL
        .iter()
        .map(|role| role.to_string())
        .chain((0..INDEXED_COLORS).map(|i| format!("color{i}")))
        .collect()
}

/// Check a decoded document and turn it into a [`ColorMapping`].
///
/// Required roles are checked first, then every color role value. Keys that
/// are not color roles pass through untouched. Values are never normalized.
pub fn validate(candidate: Value) -> Result<ColorMapping, ValidationError> {
    let Value::Object(document) = candidate else {
        return Err(ValidationError::NotAnObject);
    };

    let flattened = flatten_roles(&document);

    let missing: BTreeSet<String> = required_roles()
        .into_iter()
        .filter(|role| !flattened.contains_key(role))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingKeys { missing });
    }

    let mut roles = BTreeMap::new();
    for (key, value) in flattened {
        match value {
            Value::String(s) if !is_color_role(&key) || is_hex_color(&s) => {
                roles.insert(key, s);
            }
            Value::String(s) => {
                return Err(ValidationError::MalformedColor { key, value: s });
            }
            other if is_color_role(&key) => {
                return Err(ValidationError::MalformedColor {
                    key,
                    value: other.to_string(),
                });
            }
            // Non-string metadata outside the color roles
            _ => {}
        }
    }

    Ok(ColorMapping::from_parts(document, roles))
}
