// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Typed builders for CSL-JSON reference records.
//!
//! Anything implementing `Serialize` can be handed to
//! [`crate::Driver::insert_reference`]; these types are a convenience for
//! callers that do not already hold their references as JSON.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

/// One bibliographic record.
///
/// # Examples
///
/// ```
/// use citeproc::csl_json::{Date, Name, Reference};
///
/// let reference = Reference::new("smith2001", "book")
///     .with("title", "A Flight of Sparrows")
///     .with("author", vec![Name::person("Smith", "John")])
///     .with("issued", Date::year(2001));
///
/// let json = serde_json::to_value(&reference).unwrap();
/// assert_eq!(json["id"], "smith2001");
/// assert_eq!(json["author"][0]["family"], "Smith");
/// assert_eq!(json["issued"]["date-parts"][0][0], 2001);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub id: String,
    pub csl_type: String,
    pub variables: BTreeMap<String, Variable>,
}

impl Reference {
    pub fn new(id: impl Into<String>, csl_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            csl_type: csl_type.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Sets a variable, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Variable>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a variable, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Variable>) -> Option<Variable> {
        self.variables.insert(name.into(), value.into())
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let variables: Vec<_> = self
            .variables
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "id" | "type"))
            .collect();
        let mut map = serializer.serialize_map(Some(variables.len() + 2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("type", &self.csl_type)?;
        for (name, value) in variables {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The value of one CSL variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Variable {
    String(String),
    Number(NumString),
    Names(Vec<Name>),
    Date(Date),
    Title(Title),
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Variable {
    fn from(value: i64) -> Self {
        Self::Number(NumString::Number(value))
    }
}

impl From<NumString> for Variable {
    fn from(value: NumString) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<Name>> for Variable {
    fn from(value: Vec<Name>) -> Self {
        Self::Names(value)
    }
}

impl From<Date> for Variable {
    fn from(value: Date) -> Self {
        Self::Date(value)
    }
}

impl From<Title> for Variable {
    fn from(value: Title) -> Self {
        Self::Title(value)
    }
}

/// A number that CSL-JSON allows to be written either way, e.g. `"12-14"` or `12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NumString {
    Number(i64),
    String(String),
}

impl From<i64> for NumString {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for NumString {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// A personal or institutional name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_dropping_particle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropping_particle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Used verbatim, e.g. for institutions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
}

impl Name {
    pub fn person(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            given: Some(given.into()),
            ..Self::default()
        }
    }

    pub fn literal(literal: impl Into<String>) -> Self {
        Self {
            literal: Some(literal.into()),
            ..Self::default()
        }
    }
}

/// A date, either structured (`date-parts`) or as text to be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Date {
    /// One or two `[year, month?, day?]` entries; two make a range.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub date_parts: Vec<Vec<NumString>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub circa: bool,
    /// 1 to 4 for spring to winter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<NumString>,
}

impl Date {
    pub fn year(year: i64) -> Self {
        Self::parts(&[year])
    }

    pub fn ymd(year: i64, month: i64, day: i64) -> Self {
        Self::parts(&[year, month, day])
    }

    pub fn parts(parts: &[i64]) -> Self {
        Self {
            date_parts: vec![parts.iter().copied().map(NumString::Number).collect()],
            ..Self::default()
        }
    }

    pub fn range(from: &[i64], to: &[i64]) -> Self {
        Self {
            date_parts: [from, to]
                .iter()
                .map(|parts| parts.iter().copied().map(NumString::Number).collect())
                .collect(),
            ..Self::default()
        }
    }

    pub fn raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..Self::default()
        }
    }

    pub fn literal(literal: impl Into<String>) -> Self {
        Self {
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    pub fn circa(mut self) -> Self {
        self.circa = true;
        self
    }
}

/// A title, plain or split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Title {
    String(String),
    Object {
        #[serde(skip_serializing_if = "Option::is_none")]
        full: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        main: Option<String>,
        /// Subtitles, in order.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        sub: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        short: Option<String>,
    },
}
