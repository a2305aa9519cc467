use super::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Separator between group keys and leaf keys in a field path.
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Select,
    Checkbox,
    Radio,
    Date,
    Group,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Number => "Number",
            Self::Select => "Select",
            Self::Checkbox => "Checkbox",
            Self::Radio => "Radio",
            Self::Date => "Date",
            Self::Group => "Group",
        }
    }

    /// Kinds whose value is picked from a resolved option list.
    pub const fn is_choice(self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One clause of a field's activation condition. Every clause on a field
/// must hold for the field to be active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Field path of the value being inspected.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_empty: bool,
}

impl Dependency {
    pub fn equals(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            equals: Some(value.into()),
            not_empty: false,
        }
    }

    pub fn not_empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            equals: None,
            not_empty: true,
        }
    }
}

/// Derives a select's choices from another field's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSource {
    /// Field path of the source value.
    pub key: String,
    pub map: BTreeMap<String, Vec<String>>,
}

impl OptionSource {
    pub fn new<K, I, V, O>(key: impl Into<String>, entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        V: IntoIterator<Item = O>,
        O: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(value, options)| {
                (
                    value.into(),
                    options.into_iter().map(Into::into).collect::<Vec<String>>(),
                )
            })
            .collect();

        Self {
            key: key.into(),
            map,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, rename = "options", skip_serializing_if = "Vec::is_empty")]
    pub static_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_source: Option<OptionSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, rename = "fields", skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<FieldDescriptor>,
    /// Field paths invalidated whenever this field's value changes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clears: Vec<String>,
    /// Keep the `clears` targets' values and only re-validate them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preserve_on_change: bool,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            static_options: Vec::new(),
            option_source: None,
            dependencies: Vec::new(),
            sub_fields: Vec::new(),
            clears: Vec::new(),
            preserve_on_change: false,
        }
    }

    pub fn group(
        key: impl Into<String>,
        label: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        let mut group = Self::new(key, label, FieldKind::Group);
        group.sub_fields = fields;
        group
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, O>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        self.static_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_option_source(mut self, source: OptionSource) -> Self {
        self.option_source = Some(source);
        self
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn clears<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.clears = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn preserving_on_change(mut self) -> Self {
        self.preserve_on_change = true;
        self
    }

    pub fn is_group(&self) -> bool {
        self.kind == FieldKind::Group
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl StepDescriptor {
    pub fn new(title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }
}

/// Ordered steps; the final step is the review step and carries no editable
/// fields of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub steps: Vec<StepDescriptor>,
}

impl FormSchema {
    /// Builds and checks a schema.
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, SchemaError> {
        let schema = Self { steps };
        schema.check()?;
        Ok(schema)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(raw)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Index of the review step.
    pub fn last_step_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn editable_steps(&self) -> &[StepDescriptor] {
        &self.steps[..self.last_step_index()]
    }

    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    /// Locates a field by its full path, searching editable steps in order.
    pub fn find_field(&self, path: &str) -> Option<(usize, &FieldDescriptor)> {
        self.editable_steps()
            .iter()
            .enumerate()
            .find_map(|(index, step)| find_in(&step.fields, path).map(|field| (index, field)))
    }

    pub fn check(&self) -> Result<(), SchemaError> {
        if self.steps.len() < 2 {
            return Err(SchemaError::MissingSteps {
                found: self.steps.len(),
            });
        }

        for step in self.editable_steps() {
            let mut seen = BTreeSet::new();
            check_fields(&step.title, &step.fields, None, &mut seen)?;
        }

        Ok(())
    }
}

pub fn join_path(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{key}"),
        None => key.to_string(),
    }
}

fn find_in<'a>(fields: &'a [FieldDescriptor], path: &str) -> Option<&'a FieldDescriptor> {
    let (head, rest) = match path.split_once(PATH_SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let field = fields.iter().find(|field| field.key == head)?;
    match rest {
        None => Some(field),
        Some(rest) if field.is_group() => find_in(&field.sub_fields, rest),
        Some(_) => None,
    }
}

fn check_fields(
    step: &str,
    fields: &[FieldDescriptor],
    parent: Option<&str>,
    seen: &mut BTreeSet<String>,
) -> Result<(), SchemaError> {
    for field in fields {
        if field.key.trim().is_empty() {
            return Err(SchemaError::EmptyKey {
                step: step.to_string(),
            });
        }
        if field.key.contains(PATH_SEPARATOR) {
            return Err(SchemaError::InvalidKey {
                key: field.key.clone(),
            });
        }

        let path = join_path(parent, &field.key);
        if !seen.insert(path.clone()) {
            return Err(SchemaError::DuplicatePath {
                step: step.to_string(),
                path,
            });
        }

        if field.is_group() {
            if !field.static_options.is_empty() || field.option_source.is_some() {
                return Err(SchemaError::GroupWithOptions { path });
            }
            if field.sub_fields.is_empty() {
                return Err(SchemaError::EmptyGroup { path });
            }
            check_fields(step, &field.sub_fields, Some(&path), seen)?;
        } else if !field.sub_fields.is_empty() {
            return Err(SchemaError::LeafWithChildren { path });
        }
    }

    Ok(())
}

/// Raised when a schema cannot be rendered at all.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unable to read schema from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("schema needs at least one editable step and a review step (found {found} step(s))")]
    MissingSteps { found: usize },
    #[error("step '{step}' contains a field with an empty key")]
    EmptyKey { step: String },
    #[error("field key '{key}' must not contain '.'")]
    InvalidKey { key: String },
    #[error("field path '{path}' appears more than once in step '{step}'")]
    DuplicatePath { step: String, path: String },
    #[error("group '{path}' must not declare options")]
    GroupWithOptions { path: String },
    #[error("group '{path}' has no sub-fields")]
    EmptyGroup { path: String },
    #[error("field '{path}' is not a group but declares sub-fields")]
    LeafWithChildren { path: String },
}
