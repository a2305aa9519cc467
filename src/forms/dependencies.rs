use super::options::{hidden_by_empty_options, options_for};
use super::schema::{Dependency, FieldDescriptor};
use super::value::{FieldValue, FormState};

/// True when every dependency clause on `field` holds against `state`.
/// Fields without dependencies are always active. Never cached: targets may
/// be siblings that change independently of the field itself.
pub fn is_active(field: &FieldDescriptor, state: &FormState) -> bool {
    field
        .dependencies
        .iter()
        .all(|dependency| dependency_holds(dependency, state))
}

/// Dependency clauses plus the dynamic option rule: a field fed by an
/// option source that currently yields nothing is inactive.
pub fn is_field_active(field: &FieldDescriptor, state: &FormState) -> bool {
    is_active_with_options(field, state, options_for(field, state))
}

/// Same rule as [`is_field_active`] for callers that already resolved the
/// field's options.
pub(crate) fn is_active_with_options(
    field: &FieldDescriptor,
    state: &FormState,
    options: &[String],
) -> bool {
    is_active(field, state) && !hidden_by_empty_options(field, options)
}

pub fn dependency_holds(dependency: &Dependency, state: &FormState) -> bool {
    let current = state.get(&dependency.key);

    if let Some(expected) = &dependency.equals {
        return current == expected;
    }

    if dependency.not_empty {
        return match current {
            FieldValue::Unset => false,
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => true,
        };
    }

    true
}
