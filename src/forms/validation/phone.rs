use super::config::ValidationConfig;
use super::messages::{phone_digit_range, phone_exact_digits, PHONE_DIGITS_ONLY};
use crate::forms::schema::PATH_SEPARATOR;
use crate::forms::value::{FieldValue, FormState};

const COUNTRY_CODE_KEY: &str = "countryCode";

/// Finds the dialing code that applies to the phone field at `phone_path`.
///
/// Search order: a `countryCode` sibling in the same group, a root-level
/// `countryCode`, then any field whose path mentions "country" and whose
/// value starts with `+`.
pub(crate) fn locate_country_code(phone_path: &str, state: &FormState) -> Option<String> {
    if let Some((group, _)) = phone_path.rsplit_once(PATH_SEPARATOR) {
        let sibling = format!("{group}{PATH_SEPARATOR}{COUNTRY_CODE_KEY}");
        if let Some(code) = state.get(&sibling).to_text() {
            return Some(code);
        }
    }

    if let Some(code) = state.get(COUNTRY_CODE_KEY).to_text() {
        return Some(code);
    }

    state.iter().find_map(|(path, value)| match value {
        FieldValue::Text(text)
            if path.to_lowercase().contains("country") && text.starts_with('+') =>
        {
            Some(text.clone())
        }
        _ => None,
    })
}

/// Checks a non-blank phone entry: digits only, then an exact length for a
/// known dialing code or the fallback range otherwise.
pub(crate) fn check_phone(
    digits: &str,
    country_code: Option<&str>,
    config: &ValidationConfig,
) -> Result<(), String> {
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(PHONE_DIGITS_ONLY.to_string());
    }

    let length = digits.len();
    let exact = country_code.and_then(|code| config.digits_for(code).map(|count| (code, count)));

    match exact {
        Some((code, expected)) if length != expected => Err(phone_exact_digits(expected, code)),
        Some(_) => Ok(()),
        None => {
            let range = config.fallback_phone_digits;
            if range.contains(length) {
                Ok(())
            } else {
                Err(phone_digit_range(range.min, range.max))
            }
        }
    }
}
