use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value captured for a single field path.
///
/// Serialised untagged so a submitted form reads as a plain JSON object:
/// strings, numbers, booleans and `null` for values that were never set or
/// were cleared by an upstream edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    #[default]
    Unset,
}

static UNSET: FieldValue = FieldValue::Unset;

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Missing and blank are indistinguishable for validation purposes.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Unset => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Textual form used for option lookups and string-shaped validation.
    /// `None` for unset values and empty strings.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) if text.is_empty() => None,
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Number(number) => Some(format_number(*number)),
            FieldValue::Bool(flag) => Some(flag.to_string()),
            FieldValue::Unset => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => f.write_str(&format_number(*number)),
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Unset => Ok(()),
        }
    }
}

pub(crate) fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// Field path -> value store shared by the walker, the validator and the
/// review view. The only write path is [`FormState::set_field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown paths read as [`FieldValue::Unset`].
    pub fn get(&self, path: &str) -> &FieldValue {
        self.values.get(path).unwrap_or(&UNSET)
    }

    /// Writes `value` at `path`, returning whatever was stored before.
    pub fn set_field(
        &mut self,
        path: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> FieldValue {
        self.values
            .insert(path.into(), value.into())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, FieldValue> {
        self.values.clone()
    }
}
