//! Structured response parser for oracle output.
//!
//! # Format
//! ```text
//! STATUS: HAS_PLURAL
//! PLURAL_FORM: Hunde
//! Some free text the parser ignores.
//! - ich: CORRECT
//! - er: INCORRECT | geht
//! ```
//!
//! `LABEL: value` lines are matched against a [`Schema`]; labels are
//! case-insensitive and may be wrapped in markdown emphasis. Bulleted
//! `- key: value` lines are collected separately by [`parse_entries`].

use crate::error::ParseError;
use std::collections::HashMap;

/// One labeled field the oracle is asked to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub required: bool,
    /// Placeholder shown in the response template.
    pub hint: &'static str,
}

impl FieldSpec {
    pub const fn required(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            required: true,
            hint,
        }
    }

    pub const fn optional(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            required: false,
            hint,
        }
    }
}

/// Set of labeled fields expected in one kind of oracle response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Schema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    fn spec(&self, label: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
    }

    /// Response template listing every field, one per line.
    pub fn template(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}: {}", f.label, f.hint))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Field values extracted from one response, keyed by schema label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    values: HashMap<&'static str, String>,
}

impl FieldMap {
    /// Value for a label, if present.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(label))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Value for a label that the schema marks as required.
    pub fn require(&self, label: &str) -> Result<&str, ParseError> {
        self.get(label).ok_or_else(|| ParseError::MissingField {
            label: label.to_string(),
        })
    }

    /// Number of labels with a non-empty value.
    pub fn len(&self) -> usize {
        self.values.values().filter(|v| !v.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse oracle text against a schema.
///
/// Only the first occurrence of a label counts, even when its value is
/// empty. A required label that is absent, or first seen with an empty
/// value, is a `MissingField` error.
pub fn parse(text: &str, schema: &Schema) -> Result<FieldMap, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let mut map = FieldMap::default();

    for line in text.lines() {
        let LineType::Field(label, value) = LineType::classify(line) else {
            continue;
        };
        let Some(spec) = schema.spec(label) else {
            continue;
        };
        map.values
            .entry(spec.label)
            .or_insert_with(|| value.to_string());
    }

    if let Some(missing) = schema
        .fields
        .iter()
        .find(|f| f.required && map.get(f.label).is_none())
    {
        return Err(ParseError::MissingField {
            label: missing.label.to_string(),
        });
    }

    Ok(map)
}

/// Collect bulleted `- key: value` lines in order, first occurrence wins.
pub fn parse_entries(text: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if let LineType::Entry(key, value) = LineType::classify(line) {
            if entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
                continue;
            }
            entries.push((key.to_string(), value.to_string()));
        }
    }

    entries
}

enum LineType<'a> {
    Field(&'a str, &'a str),
    Entry(&'a str, &'a str),
    Text,
}

impl<'a> LineType<'a> {
    fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();

        if let Some(rest) = strip_bullet(trimmed) {
            return match split_labeled(rest) {
                Some((key, value)) => Self::Entry(key, value),
                None => Self::Text,
            };
        }

        match split_labeled(trimmed) {
            Some((label, value)) if is_label(label) => Self::Field(label, value),
            _ => Self::Text,
        }
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    ["- ", "* ", "• "]
        .iter()
        .find_map(|bullet| line.strip_prefix(bullet))
        .map(str::trim)
}

fn split_labeled(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = label.trim().trim_matches('*').trim();
    let value = value.trim().trim_start_matches('*').trim();
    if label.is_empty() {
        return None;
    }
    Some((label, value))
}

fn is_label(label: &str) -> bool {
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}
