//! Censored-region table.
//!
//! Maps international calling codes to the regions known to block the
//! service. Lookups use the longest matching calling code, so a table
//! holding both `9` and `971` classifies `+971…` as `971`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{CensorshipError, CensorshipResult};
use super::phone::PhoneNumber;
use crate::policy::{normalize_country_code, normalize_domain};

/// Longest calling code defined by ITU-T E.164.
const MAX_CALLING_CODE_LEN: usize = 3;

/// A region known to censor the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensoredRegion {
    /// International calling code without the `+` (for example `"971"`).
    pub calling_code: String,

    /// ISO 3166-1 alpha-2 country code (for example `"AE"`).
    pub country_code: String,

    /// Fronting domain to use for this region, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fronting_domain: Option<String>,
}

impl CensoredRegion {
    /// Creates a region entry without a fronting domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the calling code or country code is malformed.
    pub fn new(calling_code: &str, country_code: &str) -> CensorshipResult<Self> {
        let calling_code = calling_code.trim().trim_start_matches('+');
        if calling_code.is_empty()
            || calling_code.len() > MAX_CALLING_CODE_LEN
            || !calling_code.bytes().all(|b| b.is_ascii_digit())
            || calling_code.starts_with('0')
        {
            return Err(CensorshipError::InvalidCallingCode(calling_code.to_string()));
        }

        let country_code = normalize_country_code(country_code)
            .map_err(|_| CensorshipError::InvalidCountryCode(country_code.to_string()))?;

        Ok(Self {
            calling_code: calling_code.to_string(),
            country_code,
            fronting_domain: None,
        })
    }

    /// Sets the fronting domain for this region.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is not a valid host name.
    pub fn with_fronting_domain(mut self, domain: &str) -> CensorshipResult<Self> {
        let domain =
            normalize_domain(domain).map_err(|e| CensorshipError::InvalidFrontingDomain {
                country_code: self.country_code.clone(),
                reason: e.to_string(),
            })?;
        self.fronting_domain = Some(domain);
        Ok(self)
    }

    /// Re-validates an entry that came from deserialization.
    fn normalized(self) -> CensorshipResult<Self> {
        let region = Self::new(&self.calling_code, &self.country_code)?;
        match self.fronting_domain {
            Some(domain) => region.with_fronting_domain(&domain),
            None => Ok(region),
        }
    }
}

/// Set of censored regions keyed by calling code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensorshipTable {
    regions: BTreeMap<String, CensoredRegion>,
}

impl CensorshipTable {
    /// Builds a table from a list of regions.
    ///
    /// Every entry is re-validated and normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is malformed or two entries share a
    /// calling code.
    pub fn new(regions: impl IntoIterator<Item = CensoredRegion>) -> CensorshipResult<Self> {
        let mut map = BTreeMap::new();
        for region in regions {
            let region = region.normalized()?;
            if map.contains_key(&region.calling_code) {
                return Err(CensorshipError::DuplicateCallingCode(region.calling_code));
            }
            map.insert(region.calling_code.clone(), region);
        }
        Ok(Self { regions: map })
    }

    /// The regions the service is known to be blocked in.
    ///
    /// Carries calling codes and country codes only. Fronting domains are
    /// deployment configuration and are never built in.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [("20", "EG"), ("968", "OM"), ("971", "AE"), ("974", "QA")];
        let regions = entries
            .into_iter()
            .map(|(calling_code, country_code)| {
                (
                    calling_code.to_string(),
                    CensoredRegion {
                        calling_code: calling_code.to_string(),
                        country_code: country_code.to_string(),
                        fronting_domain: None,
                    },
                )
            })
            .collect();
        Self { regions }
    }

    /// Returns the region a phone number belongs to, if it is censored.
    #[must_use]
    pub fn lookup(&self, phone_number: &PhoneNumber) -> Option<&CensoredRegion> {
        let digits = phone_number.digits();
        (1..=MAX_CALLING_CODE_LEN.min(digits.len()))
            .rev()
            .find_map(|len| self.regions.get(&digits[..len]))
    }

    /// Returns the region with the given country code.
    #[must_use]
    pub fn region_for_country(&self, country_code: &str) -> Option<&CensoredRegion> {
        self.regions
            .values()
            .find(|region| region.country_code.eq_ignore_ascii_case(country_code.trim()))
    }

    /// Returns all regions ordered by calling code.
    pub fn regions(&self) -> impl Iterator<Item = &CensoredRegion> {
        self.regions.values()
    }

    /// Returns the number of regions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if the table has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
