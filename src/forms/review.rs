use std::fmt::Write as _;

use serde::Serialize;

use super::schema::{FieldKind, FormSchema};
use super::value::{FieldValue, FormState};
use super::visit::{walk_fields, FieldContext, FieldVisitor, Visibility};

/// Placeholder shown for fields the user left empty.
pub const NOT_PROVIDED: &str = "Not provided";

/// Read-only summary of everything collected, one section per editable step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationView {
    pub sections: Vec<ReviewSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSection {
    /// Step index to pass to `jump_to` when the user wants to edit this section.
    pub step: usize,
    pub title: String,
    pub entries: Vec<ReviewEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEntry {
    pub path: String,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    pub display: String,
}

impl ConfirmationView {
    pub fn build(schema: &FormSchema, state: &FormState) -> Self {
        struct Entries(Vec<ReviewEntry>);

        impl<'a> FieldVisitor<'a> for Entries {
            fn leaf(&mut self, context: &FieldContext<'a>) {
                self.0.push(ReviewEntry {
                    path: context.path.clone(),
                    label: context.field.label.clone(),
                    groups: context.groups.iter().map(|label| label.to_string()).collect(),
                    display: display_value(context.field.kind, context.value),
                });
            }
        }

        let sections = schema
            .editable_steps()
            .iter()
            .enumerate()
            .map(|(step, descriptor)| {
                let mut entries = Entries(Vec::new());
                walk_fields(&descriptor.fields, state, Visibility::ActiveOnly, &mut entries);
                ReviewSection {
                    step,
                    title: descriptor.title.clone(),
                    entries: entries.0,
                }
            })
            .collect();

        Self { sections }
    }

    pub fn entry(&self, path: &str) -> Option<&ReviewEntry> {
        self.sections
            .iter()
            .flat_map(|section| section.entries.iter())
            .find(|entry| entry.path == path)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(out, "{}. {}", section.step + 1, section.title);
            for entry in &section.entries {
                let _ = if entry.groups.is_empty() {
                    writeln!(out, "   {}: {}", entry.label, entry.display)
                } else {
                    writeln!(
                        out,
                        "   {} / {}: {}",
                        entry.groups.join(" / "),
                        entry.label,
                        entry.display
                    )
                };
            }
        }
        out
    }
}

/// Display string for one stored value.
pub fn display_value(kind: FieldKind, value: &FieldValue) -> String {
    if kind == FieldKind::Checkbox {
        let checked = match value {
            FieldValue::Bool(flag) => *flag,
            FieldValue::Text(text) => text.trim() == "true",
            FieldValue::Number(_) | FieldValue::Unset => false,
        };
        return if checked { "Yes" } else { "No" }.to_string();
    }

    if value.is_blank() {
        NOT_PROVIDED.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::{Dependency, FieldDescriptor, StepDescriptor};

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            StepDescriptor::new(
                "Details",
                vec![
                    FieldDescriptor::new("firstName", "First Name", FieldKind::Text),
                    FieldDescriptor::new("hasParking", "Has Parking", FieldKind::Checkbox),
                    FieldDescriptor::new("parkingSpaces", "Parking Spaces", FieldKind::Number)
                        .depends_on(Dependency::equals("hasParking", true)),
                    FieldDescriptor::group(
                        "contact",
                        "Contact",
                        vec![FieldDescriptor::new("phone", "Phone", FieldKind::Text)],
                    ),
                ],
            ),
            StepDescriptor::new("Review", Vec::new()),
        ])
        .expect("valid schema")
    }

    #[test]
    fn displays_checkbox_and_placeholder() {
        let mut state = FormState::new();
        state.set_field("firstName", "Lina");

        let view = ConfirmationView::build(&schema(), &state);
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.entry("firstName").map(|e| e.display.as_str()), Some("Lina"));
        assert_eq!(view.entry("hasParking").map(|e| e.display.as_str()), Some("No"));
        assert_eq!(
            view.entry("contact.phone").map(|e| e.display.as_str()),
            Some(NOT_PROVIDED)
        );
        assert!(view.entry("parkingSpaces").is_none());
    }

    #[test]
    fn integral_numbers_and_group_trail() {
        let mut state = FormState::new();
        state.set_field("hasParking", true);
        state.set_field("parkingSpaces", 2_i64);
        state.set_field("contact.phone", "5551234");

        let view = ConfirmationView::build(&schema(), &state);
        assert_eq!(view.entry("hasParking").map(|e| e.display.as_str()), Some("Yes"));
        assert_eq!(view.entry("parkingSpaces").map(|e| e.display.as_str()), Some("2"));

        let phone = view.entry("contact.phone").expect("phone entry");
        assert_eq!(phone.groups, ["Contact"]);

        let text = view.render_text();
        assert!(text.starts_with("1. Details\n"));
        assert!(text.contains("   Contact / Phone: 5551234\n"));
    }
}
