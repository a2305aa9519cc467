use super::schema::FieldDescriptor;
use super::value::FormState;

/// Resolves the selectable choices for `field`.
///
/// Static options apply unless an option source is declared; a source whose
/// value is unset or missing from the map yields no choices at all.
pub fn options_for<'a>(field: &'a FieldDescriptor, state: &FormState) -> &'a [String] {
    let Some(source) = &field.option_source else {
        return &field.static_options;
    };

    state
        .get(&source.key)
        .to_text()
        .and_then(|value| source.map.get(&value))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn hidden_by_empty_options(field: &FieldDescriptor, options: &[String]) -> bool {
    field.option_source.is_some() && options.is_empty()
}
