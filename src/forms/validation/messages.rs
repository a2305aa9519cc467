#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageKind {
    Required,
    Invalid,
}

/// Custom wording for well-known field keys; everything else falls back to
/// a message generated from the label.
fn custom_message(key: &str, kind: MessageKind) -> Option<&'static str> {
    use MessageKind::{Invalid, Required};

    let message = match (key, kind) {
        ("email", Required) => "Please enter your email address",
        ("email", Invalid) => "Please enter a valid email address",
        ("phone", Required) => "Phone number is required",
        ("firstName", Required) => "First name is required",
        ("firstName", Invalid) => "Please enter a valid first name",
        ("lastName", Required) => "Last name is required",
        ("lastName", Invalid) => "Please enter a valid last name",
        ("propertyType", Required) => "Please select a property type",
        ("category", Required) => "Please select a category",
        ("subCategory", Required) => "Please select a subcategory",
        ("price", Required) => "Price is required",
        ("price", Invalid) => "Please enter a valid price",
        ("date", Required) => "Date is required",
        ("date", Invalid) => "Please enter a valid date",
        _ => return None,
    };

    Some(message)
}

pub(crate) fn message_for(key: &str, label: &str, kind: MessageKind) -> String {
    if let Some(message) = custom_message(key, kind) {
        return message.to_string();
    }

    match kind {
        MessageKind::Required => format!("{label} is required"),
        MessageKind::Invalid => format!("Please enter a valid {}", label.to_lowercase()),
    }
}

pub(crate) const PHONE_DIGITS_ONLY: &str = "Phone number must contain only digits";

pub(crate) fn phone_exact_digits(digits: usize, country_code: &str) -> String {
    format!("Phone number must be exactly {digits} digits for {country_code}")
}

pub(crate) fn phone_digit_range(min: usize, max: usize) -> String {
    format!("Phone number must be between {min} and {max} digits")
}
