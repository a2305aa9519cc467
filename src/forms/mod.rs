//! Schema-driven multi-step form engine.
//!
//! A [`FormSchema`] describes steps and nested fields. A [`FormSession`]
//! walks one user through it, validating each step before it can be left,
//! and hands the collected [`FormState`] to a [`FormSubmitter`] at the end.

pub mod catalog;
pub mod dependencies;
pub mod options;
pub mod registry;
pub mod review;
pub mod router;
pub mod schema;
pub mod session;
pub mod submission;
pub mod validation;
pub mod value;
pub mod visit;
pub mod walker;

pub use dependencies::{dependency_holds, is_active, is_field_active};
pub use options::options_for;
pub use registry::{RegistryError, SessionId, SessionRegistry, SharedSession};
pub use review::{ConfirmationView, ReviewEntry, ReviewSection, NOT_PROVIDED};
pub use router::{session_router, FormsState, SessionView};
pub use schema::{
    Dependency, FieldDescriptor, FieldKind, FormSchema, OptionSource, SchemaError, StepDescriptor,
};
pub use session::{
    AdvanceOutcome, FormSession, SessionAction, SessionError, SessionStatus, StepRejection,
};
pub use submission::{
    FormSubmitter, InMemorySubmitter, JsonExportSubmitter, SubmissionError, SubmissionPayload,
    SubmissionReceipt,
};
pub use validation::{
    missing_required_labels, DigitRange, StepValidator, ValidationConfig, ValidationReport,
};
pub use value::{FieldValue, FormState};
pub use visit::{walk_fields, FieldContext, FieldVisitor, Visibility};
pub use walker::{active_fields, apply_edit, ActiveField, EditEffect};
