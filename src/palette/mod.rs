//! Color palettes produced by the colorscheme generator
//!
//! A palette document is a JSON object. Roles may sit at the top level
//! (`{"background": "#000000", ...}`) or inside the `special` / `colors`
//! sections the generator writes; both are flattened into one role set.
//! The original document is kept so backups round-trip in the same shape.

mod error;
mod validate;

pub use error::{LoadError, ValidationError};
pub use validate::validate;

use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::palette::{REQUIRED_SPECIAL, ROLE_SECTIONS};

/// A validated palette: immutable, replaced wholesale on reload
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMapping {
    document: Map<String, Value>,
    roles: BTreeMap<String, String>,
}

impl ColorMapping {
    /// Only the validator builds mappings
    fn from_parts(document: Map<String, Value>, roles: BTreeMap<String, String>) -> Self {
        Self { document, roles }
    }

    /// Decode and validate a JSON document
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(validate(value)?)
    }

    /// Read, decode and validate a palette file
    pub fn load_from_file(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Palette used when neither the live file nor any backup is usable
    pub fn builtin() -> Self {
        let document = json!({
            "alpha": "100",
            "special": {
                "background": "#0F0F0F",
                "foreground": "#d3d9db",
                "cursor": "#d3d9db"
            },
            "colors": {
                "color0": "#0F0F0F",
                "color1": "#9B8A77",
                "color2": "#4B768A",
                "color3": "#6A8FA0",
                "color4": "#97A1A1",
                "color5": "#AFB6B4",
                "color6": "#C2BEB5",
                "color7": "#d3d9db",
                "color8": "#939799",
                "color9": "#9B8A77",
                "color10": "#4B768A",
                "color11": "#6A8FA0",
                "color12": "#97A1A1",
                "color13": "#AFB6B4",
                "color14": "#E4A3A8",
                "color15": "#E9D2D4"
            }
        });
        let document = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let roles = flatten_roles(&document)
            .into_iter()
            .filter_map(|(role, value)| value.as_str().map(|s| (role, s.to_string())))
            .collect();
        Self::from_parts(document, roles)
    }

    /// Color for a role (`background`, `color4`, ...)
    pub fn get(&self, role: &str) -> Option<&str> {
        self.roles.get(role).map(String::as_str)
    }

    pub fn background(&self) -> &str {
        self.get("background").unwrap_or_default()
    }

    pub fn foreground(&self) -> &str {
        self.get("foreground").unwrap_or_default()
    }

    /// Flattened role set
    pub fn roles(&self) -> &BTreeMap<String, String> {
        &self.roles
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.document)
    }
}

/// Names the validator treats as color roles (special roles and `colorN`)
pub fn is_color_role(key: &str) -> bool {
    if REQUIRED_SPECIAL.contains(&key) {
        return true;
    }
    key.strip_prefix("color")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Lift top-level roles and role-section entries into one map.
/// Section entries override top-level ones with the same name.
fn flatten_roles(document: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut roles = BTreeMap::new();

    for (key, value) in document {
        if ROLE_SECTIONS.contains(&key.as_str()) {
            continue;
        }
        if is_color_role(key) || value.is_string() {
            roles.insert(key.clone(), value.clone());
        }
    }

    for section in ROLE_SECTIONS {
        if let Some(Value::Object(entries)) = document.get(section) {
            for (key, value) in entries {
                roles.insert(key.clone(), value.clone());
            }
        }
    }

    roles
}
