//! E.164 phone number handling.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CensorshipError, CensorshipResult};

/// Minimum number of digits after the `+`.
const MIN_DIGITS: usize = 8;

/// Maximum number of digits allowed by E.164.
const MAX_DIGITS: usize = 15;

/// A validated E.164 phone number.
///
/// Formatting characters (spaces, dashes, dots, parentheses) are stripped
/// on parse, so `"+20 (10) 123-4567"` and `"+20101234567"` are equal.
///
/// # Examples
///
/// ```
/// use fronting_core::censorship::PhoneNumber;
///
/// let number = PhoneNumber::parse("+20 10 1234 5678").unwrap();
/// assert_eq!(number.as_str(), "+201012345678");
/// assert!(number.has_calling_code("20"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and normalizes a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`CensorshipError::InvalidPhoneNumber`] if the number does not
    /// start with `+`, contains anything other than digits and formatting
    /// characters, or has the wrong number of digits.
    pub fn parse(input: &str) -> CensorshipResult<Self> {
        let trimmed = input.trim();
        let Some(rest) = trimmed.strip_prefix('+') else {
            return Err(CensorshipError::InvalidPhoneNumber(
                "must start with '+'".to_string(),
            ));
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => {
                    return Err(CensorshipError::InvalidPhoneNumber(format!(
                        "unexpected character {c:?}"
                    )))
                }
            }
        }

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
            return Err(CensorshipError::InvalidPhoneNumber(format!(
                "expected {MIN_DIGITS} to {MAX_DIGITS} digits, got {}",
                digits.len()
            )));
        }

        if digits.starts_with('0') {
            return Err(CensorshipError::InvalidPhoneNumber(
                "calling code cannot start with 0".to_string(),
            ));
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized number, including the leading `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the digits without the leading `+`.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }

    /// Returns true if the number starts with the given calling code.
    #[must_use]
    pub fn has_calling_code(&self, calling_code: &str) -> bool {
        self.digits().starts_with(calling_code)
    }

    /// Returns a redacted form safe for logs: the first three digits only.
    #[must_use]
    pub fn redacted(&self) -> String {
        let prefix: String = self.digits().chars().take(3).collect();
        format!("+{prefix}…")
    }
}

// Debug is redacted so phone numbers never land in logs by accident.
impl fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhoneNumber").field(&self.redacted()).finish()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = CensorshipError;

    fn try_from(value: String) -> CensorshipResult<Self> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_formatting() {
        let number = PhoneNumber::parse(" +1 (555) 010-9999 ").unwrap();
        assert_eq!(number.as_str(), "+15550109999");
        assert_eq!(number.digits(), "15550109999");
    }

    #[test]
    fn parse_rejects_missing_plus() {
        let result = PhoneNumber::parse("15550109999");
        assert!(matches!(result, Err(CensorshipError::InvalidPhoneNumber(_))));
    }

    #[test]
    fn parse_rejects_letters() {
        let result = PhoneNumber::parse("+1555CALLNOW");
        assert!(matches!(result, Err(CensorshipError::InvalidPhoneNumber(_))));
    }

    #[test]
    fn parse_rejects_too_short_and_too_long() {
        assert!(PhoneNumber::parse("+1234567").is_err());
        assert!(PhoneNumber::parse("+1234567890123456").is_err());
    }

    #[test]
    fn parse_rejects_leading_zero() {
        assert!(PhoneNumber::parse("+0201012345678").is_err());
    }

    #[test]
    fn has_calling_code_matches_prefix() {
        let number = PhoneNumber::parse("+9715012345678").unwrap();
        assert!(number.has_calling_code("971"));
        assert!(number.has_calling_code("97"));
        assert!(!number.has_calling_code("20"));
    }

    #[test]
    fn debug_is_redacted() {
        let number = PhoneNumber::parse("+201012345678").unwrap();
        let debug_str = format!("{number:?}");
        assert!(debug_str.contains("+201"));
        assert!(!debug_str.contains("12345678"));
    }

    #[test]
    fn serde_roundtrip_validates() {
        let json = "\"+20 10 1234 5678\"";
        let number: PhoneNumber = serde_json::from_str(json).unwrap();
        assert_eq!(number.as_str(), "+201012345678");

        let bad: Result<PhoneNumber, _> = serde_json::from_str("\"not a number\"");
        assert!(bad.is_err());
    }
}
