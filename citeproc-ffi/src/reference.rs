// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! CSL-JSON reference records as the engine stores them.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Result;

/// One bibliographic record, keyed by `id`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Reference {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default = "default_type")]
    pub csl_type: String,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

fn default_type() -> String {
    "document".to_string()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        String(String),
        Number(serde_json::Number),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::String(id) => id,
        Id::Number(id) => id.to_string(),
    })
}

impl Reference {
    pub(crate) fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The text of an ordinary or number variable. `short` prefers the `-short` sibling.
    pub(crate) fn text(&self, name: &str, short: bool) -> Option<String> {
        if short && let Some(value) = self.text(&format!("{name}-short"), false) {
            return Some(value);
        }
        match name {
            "id" => return Some(self.id.clone()),
            "type" => return Some(self.csl_type.clone()),
            _ => {}
        }
        match self.variables.get(name)? {
            Value::String(value) if !value.is_empty() => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Object(object) => title_text(object, short).or_else(|| date_text(object)),
            _ => None,
        }
    }

    /// The display forms of a name variable, in order.
    pub(crate) fn names(&self, name: &str) -> Vec<String> {
        let Some(Value::Array(names)) = self.variables.get(name) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| name.as_object())
            .filter_map(display_name)
            .collect()
    }
}

fn title_text(object: &Map<String, Value>, short: bool) -> Option<String> {
    let field = |key: &str| object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    if short && let Some(value) = field("short") {
        return Some(value.to_string());
    }
    if let Some(full) = field("full") {
        return Some(full.to_string());
    }
    let main = field("main")?;
    let subtitles: Vec<&str> = match object.get("sub") {
        Some(Value::Array(subs)) => subs.iter().filter_map(Value::as_str).filter(|s| !s.is_empty()).collect(),
        _ => Vec::new(),
    };
    Some(std::iter::once(main).chain(subtitles).collect::<Vec<_>>().join(": "))
}

fn date_text(object: &Map<String, Value>) -> Option<String> {
    for key in ["literal", "raw"] {
        if let Some(value) = object.get(key).and_then(Value::as_str) {
            return Some(value.to_string());
        }
    }
    let first = object.get("date-parts")?.as_array()?.first()?.as_array()?;
    let year = first.first()?;
    match year {
        Value::Number(year) => Some(year.to_string()),
        Value::String(year) => Some(year.clone()),
        _ => None,
    }
}

fn display_name(name: &Map<String, Value>) -> Option<String> {
    let part = |key: &str| name.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    if let Some(literal) = part("literal") {
        return Some(literal.to_string());
    }
    let parts: Vec<&str> = [
        "given",
        "dropping-particle",
        "non-dropping-particle",
        "family",
        "suffix",
    ]
    .into_iter()
    .filter_map(part)
    .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}
