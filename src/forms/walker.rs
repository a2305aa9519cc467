use super::schema::{FieldDescriptor, FieldKind};
use super::validation::ValidationReport;
use super::value::{FieldValue, FormState};
use super::visit::{walk_fields, FieldContext, FieldVisitor, Visibility};
use serde::Serialize;
use tracing::debug;

/// A currently-active leaf field as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveField {
    pub path: String,
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Labels of the enclosing groups, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered active leaves of `fields` with their values, resolved options and
/// the error from the last validation run, if one is supplied.
pub fn active_fields(
    fields: &[FieldDescriptor],
    state: &FormState,
    report: Option<&ValidationReport>,
) -> Vec<ActiveField> {
    struct Collector<'r> {
        report: Option<&'r ValidationReport>,
        fields: Vec<ActiveField>,
    }

    impl<'a> FieldVisitor<'a> for Collector<'_> {
        fn leaf(&mut self, context: &FieldContext<'a>) {
            let field = context.field;
            let error = self
                .report
                .and_then(|report| report.error_for(&context.path))
                .map(str::to_string);

            self.fields.push(ActiveField {
                path: context.path.clone(),
                key: field.key.clone(),
                label: field.label.clone(),
                kind: field.kind,
                required: field.required,
                groups: context.groups.iter().map(|label| label.to_string()).collect(),
                value: context.value.clone(),
                options: field.kind.is_choice().then(|| context.options.to_vec()),
                error,
            });
        }
    }

    let mut collector = Collector {
        report,
        fields: Vec::new(),
    };
    walk_fields(fields, state, Visibility::ActiveOnly, &mut collector);
    collector.fields
}

/// What a single edit did to the form state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditEffect {
    pub path: String,
    pub previous: FieldValue,
    /// Dependent paths reset to unset by this edit.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleared: Vec<String>,
    /// Dependent paths kept as-is that should be checked again.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revalidate: Vec<String>,
}

impl EditEffect {
    pub fn changed(&self, state: &FormState) -> bool {
        state.get(&self.path) != &self.previous
    }
}

/// Writes one user edit and applies the field's invalidation rule.
///
/// Dependents listed in `clears` are reset after the write unless the field
/// preserves them, in which case they are only flagged for re-validation.
/// Re-selecting the current value touches nothing else.
pub fn apply_edit(
    field: &FieldDescriptor,
    path: &str,
    value: FieldValue,
    state: &mut FormState,
) -> EditEffect {
    let previous = state.set_field(path, value);
    let mut effect = EditEffect {
        path: path.to_string(),
        previous,
        ..EditEffect::default()
    };

    if field.clears.is_empty() || !effect.changed(state) {
        return effect;
    }

    let dependents = field
        .clears
        .iter()
        .filter(|dependent| dependent.as_str() != path)
        .cloned();

    if field.preserve_on_change {
        effect.revalidate = dependents.collect();
    } else {
        for dependent in dependents {
            state.set_field(dependent.clone(), FieldValue::Unset);
            effect.cleared.push(dependent);
        }
        debug!(path, cleared = effect.cleared.len(), "cleared dependent fields");
    }

    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::{Dependency, OptionSource};

    fn property_type() -> FieldDescriptor {
        FieldDescriptor::new("propertyType", "Property Type", FieldKind::Select)
            .with_options(["Residential", "Commercial"])
            .clears(["category", "subCategory"])
    }

    fn country_code() -> FieldDescriptor {
        FieldDescriptor::new("countryCode", "Country Code", FieldKind::Select)
            .with_options(["+966", "+1"])
            .clears(["contact.phone"])
            .preserving_on_change()
    }

    #[test]
    fn clearing_resets_listed_dependents() {
        let mut state = FormState::new();
        state.set_field("propertyType", "Residential");
        state.set_field("category", "Villa");
        state.set_field("subCategory", "Compound");
        state.set_field("price", "100");

        let effect = apply_edit(
            &property_type(),
            "propertyType",
            FieldValue::text("Commercial"),
            &mut state,
        );

        assert_eq!(effect.cleared, ["category", "subCategory"]);
        assert!(state.get("category").is_blank());
        assert!(state.get("subCategory").is_blank());
        assert_eq!(state.get("price").as_text(), Some("100"));
        assert_eq!(state.get("propertyType").as_text(), Some("Commercial"));
    }

    #[test]
    fn same_value_does_not_clear() {
        let mut state = FormState::new();
        state.set_field("propertyType", "Residential");
        state.set_field("category", "Villa");

        let effect = apply_edit(
            &property_type(),
            "propertyType",
            FieldValue::text("Residential"),
            &mut state,
        );

        assert!(effect.cleared.is_empty());
        assert_eq!(state.get("category").as_text(), Some("Villa"));
    }

    #[test]
    fn preserving_fields_flag_dependents_instead_of_clearing() {
        let mut state = FormState::new();
        state.set_field("contact.phone", "5551234");

        let effect = apply_edit(
            &country_code(),
            "contact.countryCode",
            FieldValue::text("+966"),
            &mut state,
        );

        assert!(effect.cleared.is_empty());
        assert_eq!(effect.revalidate, ["contact.phone"]);
        assert_eq!(state.get("contact.phone").as_text(), Some("5551234"));
    }

    #[test]
    fn active_fields_carry_options_and_errors() {
        let fields = vec![
            property_type(),
            FieldDescriptor::new("category", "Category", FieldKind::Select)
                .required()
                .with_option_source(OptionSource::new(
                    "propertyType",
                    [("Residential", vec!["Apartment", "Villa"])],
                ))
                .depends_on(Dependency::not_empty("propertyType")),
            FieldDescriptor::new("price", "Price", FieldKind::Number),
        ];
        let mut state = FormState::new();
        state.set_field("propertyType", "Residential");

        let mut report = ValidationReport::default();
        report
            .field_errors
            .insert("category".to_string(), "Please select a category".to_string());

        let active = active_fields(&fields, &state, Some(&report));
        assert_eq!(active.len(), 3);
        assert_eq!(
            active[1].options.as_deref(),
            Some(&["Apartment".to_string(), "Villa".to_string()][..])
        );
        assert_eq!(active[1].error.as_deref(), Some("Please select a category"));
        assert!(active[2].options.is_none());
        assert_eq!(active[0].value, FieldValue::text("Residential"));
    }
}
