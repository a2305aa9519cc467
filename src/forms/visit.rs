//! Single recursive traversal over a step's field tree.
//!
//! Rendering, rule compilation, the required-field audit and the review view
//! all consume this walk through [`FieldVisitor`], so path prefixing and the
//! activity rules live in exactly one place.

use super::dependencies::is_active_with_options;
use super::options::options_for;
use super::schema::{join_path, FieldDescriptor};
use super::value::{FieldValue, FormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Skip inactive fields and everything beneath inactive groups.
    ActiveOnly,
    /// Visit the whole tree regardless of the current state.
    All,
}

/// Everything a visitor needs to know about one field at its position in
/// the tree.
#[derive(Debug, Clone)]
pub struct FieldContext<'a> {
    pub field: &'a FieldDescriptor,
    pub path: String,
    /// Labels of the enclosing groups, outermost first.
    pub groups: Vec<&'a str>,
    pub options: &'a [String],
    pub value: &'a FieldValue,
    pub active: bool,
}

pub trait FieldVisitor<'a> {
    fn leaf(&mut self, context: &FieldContext<'a>);

    fn enter_group(&mut self, _context: &FieldContext<'a>) {}

    fn leave_group(&mut self, _context: &FieldContext<'a>) {}
}

pub fn walk_fields<'a, V>(
    fields: &'a [FieldDescriptor],
    state: &'a FormState,
    visibility: Visibility,
    visitor: &mut V,
) where
    V: FieldVisitor<'a>,
{
    let mut groups = Vec::new();
    walk_level(fields, state, visibility, None, &mut groups, visitor);
}

fn walk_level<'a, V>(
    fields: &'a [FieldDescriptor],
    state: &'a FormState,
    visibility: Visibility,
    parent: Option<&str>,
    groups: &mut Vec<&'a str>,
    visitor: &mut V,
) where
    V: FieldVisitor<'a>,
{
    for field in fields {
        let path = join_path(parent, &field.key);
        let options = options_for(field, state);
        let active = is_active_with_options(field, state, options);

        if !active && visibility == Visibility::ActiveOnly {
            continue;
        }

        let context = FieldContext {
            field,
            value: state.get(&path),
            path,
            groups: groups.clone(),
            options,
            active,
        };

        if field.is_group() {
            visitor.enter_group(&context);
            groups.push(field.label.as_str());
            walk_level(
                &field.sub_fields,
                state,
                visibility,
                Some(context.path.as_str()),
                groups,
                visitor,
            );
            groups.pop();
            visitor.leave_group(&context);
        } else {
            visitor.leaf(&context);
        }
    }
}

/// Collects leaf paths, optionally including inactive ones.
pub fn leaf_paths(
    fields: &[FieldDescriptor],
    state: &FormState,
    visibility: Visibility,
) -> Vec<String> {
    struct Paths(Vec<String>);

    impl<'a> FieldVisitor<'a> for Paths {
        fn leaf(&mut self, context: &FieldContext<'a>) {
            self.0.push(context.path.clone());
        }
    }

    let mut paths = Paths(Vec::new());
    walk_fields(fields, state, visibility, &mut paths);
    paths.0
}
