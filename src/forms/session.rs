use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::review::ConfirmationView;
use super::schema::{FieldDescriptor, FormSchema};
use super::submission::{FormSubmitter, SubmissionError, SubmissionPayload, SubmissionReceipt};
use super::validation::{missing_required_labels, StepValidator, ValidationConfig, ValidationReport};
use super::value::{FieldValue, FormState};
use super::walker::{active_fields, apply_edit, ActiveField, EditEffect};

/// Where a session currently sits in the step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Editing { step: usize },
    Reviewing,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Editing { step } => write!(f, "editing step {step}"),
            SessionStatus::Reviewing => f.write_str("reviewing"),
            SessionStatus::Submitted => f.write_str("submitted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Advance,
    Retreat,
    Jump,
    Submit,
    Edit,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionAction::Advance => "advance",
            SessionAction::Retreat => "retreat",
            SessionAction::Jump => "jump",
            SessionAction::Submit => "submit",
            SessionAction::Edit => "edit",
        };
        f.write_str(label)
    }
}

/// Result of an `advance` request. A rejection is an ordinary outcome, not
/// an error: the caller re-renders the step with the report attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced { from: usize, to: SessionStatus },
    Rejected(StepRejection),
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }
}

/// Why a step could not be left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRejection {
    pub step: usize,
    pub report: ValidationReport,
    /// Labels of active required fields that are empty, in schema order.
    pub missing_required: Vec<String>,
}

impl StepRejection {
    /// Consolidated message listing the empty required fields, if any.
    pub fn summary(&self) -> Option<String> {
        if self.missing_required.is_empty() {
            return None;
        }
        Some(format!(
            "Please fill in the following required fields: {}",
            self.missing_required.join(", ")
        ))
    }
}

/// Drives one user through the steps of a schema.
///
/// Owns the form state exclusively. Field writes go through [`edit`] or
/// [`set_field`]; transitions never touch values.
///
/// [`edit`]: FormSession::edit
/// [`set_field`]: FormSession::set_field
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Arc<FormSchema>,
    validation: ValidationConfig,
    state: FormState,
    status: SessionStatus,
    last_report: Option<ValidationReport>,
}

impl FormSession {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self::with_validation(schema, ValidationConfig::default())
    }

    pub fn with_validation(schema: Arc<FormSchema>, validation: ValidationConfig) -> Self {
        Self {
            schema,
            validation,
            state: FormState::new(),
            status: SessionStatus::Editing { step: 0 },
            last_report: None,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Errors from the most recent rejected `advance` on the current step.
    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    /// Index of the step being shown; the review step once editing is done.
    pub fn current_step(&self) -> usize {
        match self.status {
            SessionStatus::Editing { step } => step,
            SessionStatus::Reviewing | SessionStatus::Submitted => self.schema.last_step_index(),
        }
    }

    pub fn current_step_title(&self) -> &str {
        self.schema
            .step(self.current_step())
            .map(|step| step.title.as_str())
            .unwrap_or_default()
    }

    pub fn progress_percent(&self) -> f64 {
        let total = self.schema.step_count().max(1) as f64;
        (self.current_step() + 1) as f64 / total * 100.0
    }

    /// Validates the current step and moves forward when it passes.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        let SessionStatus::Editing { step } = self.status else {
            return Err(self.illegal(SessionAction::Advance));
        };

        let fields = self.step_fields(step);
        let validator = StepValidator::build(fields, &self.state, &self.validation);
        let report = validator.run(&self.state);
        let missing_required = missing_required_labels(fields, &self.state);

        if !report.is_valid() || !missing_required.is_empty() {
            info!(
                step,
                errors = report.len(),
                missing = missing_required.len(),
                "advance rejected"
            );
            self.last_report = Some(report.clone());
            return Ok(AdvanceOutcome::Rejected(StepRejection {
                step,
                report,
                missing_required,
            }));
        }

        let next = step + 1;
        self.status = if next >= self.schema.last_step_index() {
            SessionStatus::Reviewing
        } else {
            SessionStatus::Editing { step: next }
        };
        self.last_report = None;

        info!(from = step, to = %self.status, checked = validator.len(), "advance accepted");
        Ok(AdvanceOutcome::Advanced {
            from: step,
            to: self.status,
        })
    }

    /// Steps back one page without validating.
    pub fn retreat(&mut self) -> Result<SessionStatus, SessionError> {
        match self.status {
            SessionStatus::Editing { step } if step > 0 => {
                self.status = SessionStatus::Editing { step: step - 1 };
                self.last_report = None;
                info!(from = step, to = step - 1, "retreat");
                Ok(self.status)
            }
            _ => Err(self.illegal(SessionAction::Retreat)),
        }
    }

    /// Returns from the review step to an editable step without validating.
    pub fn jump_to(&mut self, step: usize) -> Result<SessionStatus, SessionError> {
        if self.status != SessionStatus::Reviewing {
            return Err(self.illegal(SessionAction::Jump));
        }

        let editable = self.schema.last_step_index();
        if step >= editable {
            return Err(SessionError::StepOutOfRange { step, editable });
        }

        self.status = SessionStatus::Editing { step };
        self.last_report = None;
        info!(step, "jump from review");
        Ok(self.status)
    }

    /// Hands the full state to `submitter`. On failure the session stays in
    /// review and the collaborator's error is returned as-is.
    pub async fn submit<S>(&mut self, submitter: &S) -> Result<SubmissionReceipt, SessionError>
    where
        S: FormSubmitter + ?Sized,
    {
        if self.status != SessionStatus::Reviewing {
            return Err(self.illegal(SessionAction::Submit));
        }

        let payload = SubmissionPayload::from(&self.state);
        info!(fields = payload.len(), "submission started");

        match submitter.submit(payload).await {
            Ok(receipt) => {
                self.status = SessionStatus::Submitted;
                info!(reference = %receipt.reference, "submission finished");
                Ok(receipt)
            }
            Err(error) => {
                warn!(%error, "submission failed");
                Err(error.into())
            }
        }
    }

    /// Discards all collected values and starts over at the first step.
    pub fn restart(&mut self) {
        self.state = FormState::new();
        self.status = SessionStatus::Editing { step: 0 };
        self.last_report = None;
        info!("session restarted");
    }

    /// Applies a user edit, including the field's invalidation rule.
    pub fn edit(
        &mut self,
        path: &str,
        value: impl Into<FieldValue>,
    ) -> Result<EditEffect, SessionError> {
        if self.status == SessionStatus::Submitted {
            return Err(self.illegal(SessionAction::Edit));
        }

        let schema = Arc::clone(&self.schema);
        let (step, field) = schema
            .find_field(path)
            .ok_or_else(|| SessionError::UnknownField(path.to_string()))?;
        if field.is_group() {
            return Err(SessionError::NotEditable(path.to_string()));
        }

        let effect = apply_edit(field, path, value.into(), &mut self.state);
        debug!(path, "field set");

        if !effect.revalidate.is_empty() && self.status == (SessionStatus::Editing { step }) {
            if let Some(report) = self.last_report.as_mut() {
                let fields = &schema.steps[step].fields;
                let validator = StepValidator::build(fields, &self.state, &self.validation);
                validator.revalidate(&effect.revalidate, &self.state, report);
                debug!(path, revalidated = effect.revalidate.len(), "dependents revalidated");
            }
        }

        Ok(effect)
    }

    /// Raw write with no invalidation, for bulk-loading answers.
    pub fn set_field(
        &mut self,
        path: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> FieldValue {
        let path = path.into();
        debug!(path = %path, "field set");
        self.state.set_field(path, value)
    }

    /// Active fields of the step being edited, with errors from the last
    /// rejected advance. Empty outside of editing.
    pub fn active_fields(&self) -> Vec<ActiveField> {
        match self.status {
            SessionStatus::Editing { step } => active_fields(
                self.step_fields(step),
                &self.state,
                self.last_report.as_ref(),
            ),
            SessionStatus::Reviewing | SessionStatus::Submitted => Vec::new(),
        }
    }

    pub fn review(&self) -> ConfirmationView {
        ConfirmationView::build(&self.schema, &self.state)
    }

    fn step_fields(&self, step: usize) -> &[FieldDescriptor] {
        self.schema
            .step(step)
            .map(|descriptor| descriptor.fields.as_slice())
            .unwrap_or_default()
    }

    fn illegal(&self, action: SessionAction) -> SessionError {
        SessionError::IllegalTransition {
            action,
            status: self.status,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} while {status}")]
    IllegalTransition {
        action: SessionAction,
        status: SessionStatus,
    },
    #[error("step {step} is not editable (editable steps: 0..{editable})")]
    StepOutOfRange { step: usize, editable: usize },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is a group and holds no value")]
    NotEditable(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::{Dependency, FieldKind, StepDescriptor};
    use crate::forms::submission::InMemorySubmitter;

    fn schema() -> Arc<FormSchema> {
        let schema = FormSchema::new(vec![
            StepDescriptor::new(
                "Contact",
                vec![
                    FieldDescriptor::new("firstName", "First Name", FieldKind::Text).required(),
                    FieldDescriptor::group(
                        "contact",
                        "Contact",
                        vec![
                            FieldDescriptor::new("countryCode", "Country Code", FieldKind::Select)
                                .with_options(["+966", "+1"])
                                .clears(["contact.phone"])
                                .preserving_on_change(),
                            FieldDescriptor::new("phone", "Phone Number", FieldKind::Text),
                        ],
                    ),
                ],
            ),
            StepDescriptor::new(
                "Parking",
                vec![
                    FieldDescriptor::new("hasParking", "Has Parking", FieldKind::Checkbox)
                        .clears(["parkingSpaces"]),
                    FieldDescriptor::new("parkingSpaces", "Parking Spaces", FieldKind::Number)
                        .required()
                        .depends_on(Dependency::equals("hasParking", true)),
                ],
            ),
            StepDescriptor::new("Review", Vec::new()),
        ])
        .expect("valid schema");
        Arc::new(schema)
    }

    #[test]
    fn starts_editing_first_step() {
        let session = FormSession::new(schema());
        assert_eq!(session.status(), SessionStatus::Editing { step: 0 });
        assert_eq!(session.current_step_title(), "Contact");
        assert!((session.progress_percent() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(session.active_fields().len(), 3);
    }

    #[test]
    fn rejected_advance_reports_missing_labels() {
        let mut session = FormSession::new(schema());
        let outcome = session.advance().expect("advance allowed");

        match outcome {
            AdvanceOutcome::Rejected(rejection) => {
                assert_eq!(rejection.missing_required, ["First Name"]);
                assert_eq!(
                    rejection.summary().as_deref(),
                    Some("Please fill in the following required fields: First Name")
                );
                assert_eq!(
                    rejection.report.error_for("firstName"),
                    Some("First name is required")
                );
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(session.status(), SessionStatus::Editing { step: 0 });

        let fields = session.active_fields();
        assert_eq!(fields[0].error.as_deref(), Some("First name is required"));
    }

    #[test]
    fn walks_to_review_and_back() {
        let mut session = FormSession::new(schema());
        session.edit("firstName", "Lina").expect("edit");
        assert!(session.advance().expect("advance").is_advanced());
        assert_eq!(session.status(), SessionStatus::Editing { step: 1 });

        assert_eq!(
            session.retreat().expect("retreat"),
            SessionStatus::Editing { step: 0 }
        );
        session.advance().expect("advance");

        let outcome = session.advance().expect("advance");
        assert_eq!(
            outcome,
            AdvanceOutcome::Advanced {
                from: 1,
                to: SessionStatus::Reviewing
            }
        );
        assert_eq!(session.progress_percent(), 100.0);
        assert_eq!(session.current_step_title(), "Review");

        assert_eq!(
            session.jump_to(1).expect("jump"),
            SessionStatus::Editing { step: 1 }
        );
    }

    #[test]
    fn illegal_transitions_are_errors() {
        let mut session = FormSession::new(schema());
        match session.retreat() {
            Err(SessionError::IllegalTransition { action, status }) => {
                assert_eq!(action, SessionAction::Retreat);
                assert_eq!(status, SessionStatus::Editing { step: 0 });
            }
            other => panic!("expected illegal transition, got {other:?}"),
        }
        assert!(matches!(
            session.jump_to(0),
            Err(SessionError::IllegalTransition { .. })
        ));

        session.edit("firstName", "Lina").expect("edit");
        session.advance().expect("advance");
        session.advance().expect("advance");
        assert!(matches!(
            session.jump_to(2),
            Err(SessionError::StepOutOfRange {
                step: 2,
                editable: 2
            })
        ));
        assert!(matches!(
            session.advance(),
            Err(SessionError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn unknown_and_group_paths_are_rejected() {
        let mut session = FormSession::new(schema());
        assert!(matches!(
            session.edit("nickname", "x"),
            Err(SessionError::UnknownField(path)) if path == "nickname"
        ));
        assert!(matches!(
            session.edit("contact", "x"),
            Err(SessionError::NotEditable(_))
        ));
    }

    #[test]
    fn preserved_dependents_are_revalidated_after_rejection() {
        let mut session = FormSession::new(schema());
        session.edit("contact.countryCode", "+966").expect("edit");
        session.edit("contact.phone", "5551234567").expect("edit");

        let outcome = session.advance().expect("advance");
        assert!(!outcome.is_advanced());
        let report = session.last_report().expect("report kept");
        assert_eq!(
            report.error_for("contact.phone"),
            Some("Phone number must be exactly 7 digits for +966")
        );

        let effect = session.edit("contact.countryCode", "+1").expect("edit");
        assert_eq!(effect.revalidate, ["contact.phone"]);
        assert_eq!(session.state().get("contact.phone").as_text(), Some("5551234567"));

        let report = session.last_report().expect("report kept");
        assert!(report.error_for("contact.phone").is_none());
        assert!(report.error_for("firstName").is_some());
    }

    #[tokio::test]
    async fn submit_requires_review_and_finishes_session() {
        let submitter = InMemorySubmitter::new();
        let mut session = FormSession::new(schema());
        assert!(matches!(
            session.submit(&submitter).await,
            Err(SessionError::IllegalTransition { .. })
        ));

        session.edit("firstName", "Lina").expect("edit");
        session.advance().expect("advance");
        session.advance().expect("advance");

        let receipt = session.submit(&submitter).await.expect("submitted");
        assert_eq!(receipt.fields, 1);
        assert_eq!(session.status(), SessionStatus::Submitted);
        assert!(matches!(
            session.edit("firstName", "Other"),
            Err(SessionError::IllegalTransition { .. })
        ));

        session.restart();
        assert_eq!(session.status(), SessionStatus::Editing { step: 0 });
        assert!(session.state().is_empty());
    }

    #[tokio::test]
    async fn failed_submit_stays_in_review() {
        let submitter = InMemorySubmitter::rejecting("offline");
        let mut session = FormSession::new(schema());
        session.edit("firstName", "Lina").expect("edit");
        session.advance().expect("advance");
        session.advance().expect("advance");

        match session.submit(&submitter).await {
            Err(SessionError::Submission(SubmissionError::Rejected(reason))) => {
                assert_eq!(reason, "offline")
            }
            other => panic!("expected submission failure, got {other:?}"),
        }
        assert_eq!(session.status(), SessionStatus::Reviewing);
    }
}
