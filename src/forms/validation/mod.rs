mod config;
mod messages;
mod phone;
mod rules;

pub use config::{DigitRange, ValidationConfig};

use super::schema::{FieldDescriptor, FieldKind};
use super::value::{FieldValue, FormState};
use super::visit::{walk_fields, FieldContext, FieldVisitor, Visibility};
use rules::FieldRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Compiled rules for the active fields of one step.
#[derive(Debug, Clone)]
pub struct StepValidator {
    rules: Vec<FieldRule>,
    config: ValidationConfig,
}

impl StepValidator {
    /// Compiles one rule per active leaf of `fields`. Inactive fields (and
    /// dynamic selects with no resolvable options) get no rule at all.
    pub fn build(
        fields: &[FieldDescriptor],
        state: &FormState,
        config: &ValidationConfig,
    ) -> Self {
        struct RuleCollector(Vec<FieldRule>);

        impl<'a> FieldVisitor<'a> for RuleCollector {
            fn leaf(&mut self, context: &FieldContext<'a>) {
                if let Some(rule) = FieldRule::from_context(context) {
                    self.0.push(rule);
                }
            }
        }

        let mut collector = RuleCollector(Vec::new());
        walk_fields(fields, state, Visibility::ActiveOnly, &mut collector);

        Self {
            rules: collector.0,
            config: config.clone(),
        }
    }

    pub fn run(&self, state: &FormState) -> ValidationReport {
        let field_errors = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.check(state, &self.config)
                    .err()
                    .map(|message| (rule.path.clone(), message))
            })
            .collect();

        ValidationReport { field_errors }
    }

    /// Re-checks only the listed paths, leaving every other entry of
    /// `report` untouched.
    pub fn revalidate(&self, paths: &[String], state: &FormState, report: &mut ValidationReport) {
        for path in paths {
            let Some(rule) = self.rules.iter().find(|rule| &rule.path == path) else {
                report.field_errors.remove(path);
                continue;
            };

            match rule.check(state, &self.config) {
                Ok(()) => {
                    report.field_errors.remove(path);
                }
                Err(message) => {
                    report.field_errors.insert(path.clone(), message);
                }
            }
        }
    }

    /// Paths of every field this validator checks, in schema order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-field failures keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn error_for(&self, path: &str) -> Option<&str> {
        self.field_errors.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.field_errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// Labels of active required fields that are currently empty, in schema
/// order. Computed independently of the compiled rules so the caller can
/// present a consolidated summary next to per-field messages.
pub fn missing_required_labels(fields: &[FieldDescriptor], state: &FormState) -> Vec<String> {
    struct RequiredAudit(Vec<String>);

    impl<'a> FieldVisitor<'a> for RequiredAudit {
        fn leaf(&mut self, context: &FieldContext<'a>) {
            if !context.field.required {
                return;
            }

            let empty = match context.field.kind {
                FieldKind::Checkbox => !is_checked(context.value),
                _ => context.value.is_blank(),
            };
            if empty {
                self.0.push(context.field.label.clone());
            }
        }
    }

    let mut audit = RequiredAudit(Vec::new());
    walk_fields(fields, state, Visibility::ActiveOnly, &mut audit);
    audit.0
}

fn is_checked(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(flag) => *flag,
        FieldValue::Text(text) => text.trim() == "true",
        FieldValue::Number(_) | FieldValue::Unset => false,
    }
}
