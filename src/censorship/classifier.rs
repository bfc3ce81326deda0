//! Phone-number censorship classifier.

use super::phone::PhoneNumber;
use super::table::{CensoredRegion, CensorshipTable};

/// Decides whether a phone number belongs to a censored region.
///
/// Classification is computed on every call against the table. The
/// routing service swaps in a new classifier when the table changes.
#[derive(Debug, Clone)]
pub struct CensorshipClassifier {
    table: CensorshipTable,
}

impl CensorshipClassifier {
    /// Creates a classifier over the given table.
    #[must_use]
    pub const fn new(table: CensorshipTable) -> Self {
        Self { table }
    }

    /// Returns the censored region for a phone number, if any.
    #[must_use]
    pub fn classify(&self, phone_number: &PhoneNumber) -> Option<&CensoredRegion> {
        self.table.lookup(phone_number)
    }

    /// Returns true if the phone number belongs to a censored region.
    #[must_use]
    pub fn is_censored(&self, phone_number: &PhoneNumber) -> bool {
        self.classify(phone_number).is_some()
    }

    /// Returns true if an optional account number is censored.
    ///
    /// An account without a phone number is never censored.
    #[must_use]
    pub fn is_censored_account(&self, phone_number: Option<&PhoneNumber>) -> bool {
        phone_number.is_some_and(|number| self.is_censored(number))
    }

    /// Returns the table entry for a manually chosen country code.
    #[must_use]
    pub fn region_for_country(&self, country_code: &str) -> Option<&CensoredRegion> {
        self.table.region_for_country(country_code)
    }

    /// Returns the current table.
    #[must_use]
    pub const fn table(&self) -> &CensorshipTable {
        &self.table
    }
}

impl Default for CensorshipClassifier {
    fn default() -> Self {
        Self::new(CensorshipTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(number: &str) -> PhoneNumber {
        PhoneNumber::parse(number).unwrap()
    }

    #[test]
    fn default_uses_builtin_table() {
        let classifier = CensorshipClassifier::default();
        assert!(classifier.is_censored(&phone("+96812345678")));
        assert!(!classifier.is_censored(&phone("+4915112345678")));
    }

    #[test]
    fn missing_account_number_is_not_censored() {
        let classifier = CensorshipClassifier::default();
        assert!(!classifier.is_censored_account(None));
        assert!(classifier.is_censored_account(Some(&phone("+97412345678"))));
    }

    #[test]
    fn region_for_country_uses_current_table() {
        let classifier = CensorshipClassifier::default();
        assert_eq!(
            classifier.region_for_country("OM").unwrap().calling_code,
            "968"
        );
    }
}
