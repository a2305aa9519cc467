use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accepted digit count for phone numbers without a resolvable country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitRange {
    pub min: usize,
    pub max: usize,
}

impl DigitRange {
    pub fn contains(&self, digits: usize) -> bool {
        (self.min..=self.max).contains(&digits)
    }
}

/// Tunables for cross-field rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Dialing code (with leading `+`) to exact subscriber digit count.
    pub country_digits: BTreeMap<String, usize>,
    pub fallback_phone_digits: DigitRange,
}

impl ValidationConfig {
    pub fn digits_for(&self, country_code: &str) -> Option<usize> {
        self.country_digits.get(country_code.trim()).copied()
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let country_digits = [("+966", 7), ("+1", 10), ("+44", 11), ("+971", 9)]
            .into_iter()
            .map(|(code, digits)| (code.to_string(), digits))
            .collect();

        Self {
            country_digits,
            fallback_phone_digits: DigitRange { min: 7, max: 15 },
        }
    }
}
