use super::config::ValidationConfig;
use super::messages::{message_for, MessageKind};
use super::phone::{check_phone, locate_country_code};
use crate::forms::schema::FieldKind;
use crate::forms::value::{FieldValue, FormState};
use crate::forms::visit::FieldContext;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RuleKind {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Choice { options: Vec<String> },
    Checkbox,
}

/// Executable rule for one active leaf field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldRule {
    pub path: String,
    pub key: String,
    pub label: String,
    pub required: bool,
    pub kind: RuleKind,
}

impl FieldRule {
    pub(crate) fn from_context(context: &FieldContext<'_>) -> Option<Self> {
        let field = context.field;
        let kind = match field.kind {
            FieldKind::Group => return None,
            FieldKind::Text => text_rule_kind(&field.key, &field.label),
            FieldKind::Number => RuleKind::Number,
            FieldKind::Date => RuleKind::Date,
            FieldKind::Select | FieldKind::Radio => RuleKind::Choice {
                options: context.options.to_vec(),
            },
            FieldKind::Checkbox => RuleKind::Checkbox,
        };

        Some(Self {
            path: context.path.clone(),
            key: field.key.clone(),
            label: field.label.clone(),
            required: field.required,
            kind,
        })
    }

    pub(crate) fn check(
        &self,
        state: &FormState,
        config: &ValidationConfig,
    ) -> Result<(), String> {
        let value = state.get(&self.path);

        match &self.kind {
            RuleKind::Checkbox => self.check_checkbox(value),
            _ if value.is_blank() => {
                if self.required {
                    Err(self.message(MessageKind::Required))
                } else {
                    Ok(())
                }
            }
            RuleKind::Text | RuleKind::Date => Ok(()),
            RuleKind::Email => {
                let text = value.to_text().unwrap_or_default();
                if is_valid_email(text.trim()) {
                    Ok(())
                } else {
                    Err(self.message(MessageKind::Invalid))
                }
            }
            RuleKind::Phone => {
                let digits = value.to_text().unwrap_or_default();
                let country_code = locate_country_code(&self.path, state);
                check_phone(&digits, country_code.as_deref(), config)
            }
            RuleKind::Number => match parse_non_negative(value) {
                Some(_) => Ok(()),
                None => Err(self.message(MessageKind::Invalid)),
            },
            RuleKind::Choice { options } => {
                let selected = value.to_text().unwrap_or_default();
                if options.is_empty() || options.iter().any(|option| *option == selected) {
                    Ok(())
                } else {
                    Err(self.message(MessageKind::Invalid))
                }
            }
        }
    }

    fn check_checkbox(&self, value: &FieldValue) -> Result<(), String> {
        let checked = match value {
            FieldValue::Bool(flag) => *flag,
            FieldValue::Unset => false,
            FieldValue::Text(text) => match text.trim() {
                "" | "false" => false,
                "true" => true,
                _ => return Err(self.message(MessageKind::Invalid)),
            },
            FieldValue::Number(_) => return Err(self.message(MessageKind::Invalid)),
        };

        if self.required && !checked {
            Err(self.message(MessageKind::Required))
        } else {
            Ok(())
        }
    }

    fn message(&self, kind: MessageKind) -> String {
        message_for(&self.key, &self.label, kind)
    }
}

fn text_rule_kind(key: &str, label: &str) -> RuleKind {
    let key = key.to_lowercase();
    let label = label.to_lowercase();

    if key.contains("email") || label.contains("email") {
        RuleKind::Email
    } else if key.contains("phone") || label.contains("phone") {
        RuleKind::Phone
    } else {
        RuleKind::Text
    }
}

fn parse_non_negative(value: &FieldValue) -> Option<f64> {
    let number = match value {
        FieldValue::Number(number) => *number,
        FieldValue::Text(text) => text.trim().parse::<f64>().ok()?,
        FieldValue::Bool(_) | FieldValue::Unset => return None,
    };

    (number.is_finite() && number >= 0.0).then_some(number)
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
        )
        .expect("email pattern compiles")
    })
}

pub(crate) fn is_valid_email(candidate: &str) -> bool {
    !candidate.starts_with('.') && !candidate.contains("..") && email_pattern().is_match(candidate)
}
