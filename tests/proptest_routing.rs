//! Property-based tests for routing decisions and input validation.
//!
//! These tests verify:
//! - The active flag always equals `manual || (automatic && censored)`
//! - The live session is fronted exactly when circumvention is active
//! - Domain normalization is idempotent and case-insensitive
//! - Malformed domains never reach the policy

use fronting_core::policy::normalize_domain;
use fronting_core::{RoutingConfig, RoutingService};
use proptest::prelude::*;

const CALLING_CODES: &[&str] = &["20", "968", "971", "974", "1", "44", "49", "98"];
const CENSORED_CODES: &[&str] = &["20", "968", "971", "974"];

fn config(automatic: bool) -> RoutingConfig {
    let mut config = RoutingConfig::new("https://service.example.org", "reflector.example.net")
        .with_default_fronting_domain("front.example.com");
    config.automatic_circumvention = automatic;
    config
}

fn phone_strategy() -> impl Strategy<Value = (String, bool)> {
    (prop::sample::select(CALLING_CODES), "[1-9][0-9]{6,8}").prop_map(|(code, rest)| {
        (format!("+{code}{rest}"), CENSORED_CODES.contains(&code))
    })
}

fn domain_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,10}(\\.[a-z][a-z0-9]{1,9}){1,3}"
}

#[derive(Debug, Clone)]
enum Op {
    Manual(bool),
    SetDomain(String),
    ClearDomain,
    SetCountry(String),
    SetPhone(Option<String>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Manual),
        domain_strategy().prop_map(Op::SetDomain),
        Just(Op::ClearDomain),
        "[A-Za-z]{2}".prop_map(Op::SetCountry),
        prop::option::of(phone_strategy().prop_map(|(number, _)| number)).prop_map(Op::SetPhone),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: For every combination of manual activation, automatic
    /// mode and phone number, the active flag follows the formula and the
    /// session agrees with it.
    #[test]
    fn active_flag_matches_formula(
        manual in any::<bool>(),
        automatic in any::<bool>(),
        phone in prop::option::of(phone_strategy()),
    ) {
        let number = phone.as_ref().map(|(number, _)| number.as_str());
        let censored = phone.as_ref().is_some_and(|(_, censored)| *censored);

        let service = RoutingService::in_memory(config(automatic), number).unwrap();
        service.set_censorship_circumvention_manually_activated(manual).unwrap();

        prop_assert_eq!(service.has_censored_phone_number(), censored);
        prop_assert_eq!(
            service.is_censorship_circumvention_active(),
            manual || (automatic && censored)
        );
        prop_assert_eq!(
            service.session().is_fronted(),
            service.is_censorship_circumvention_active()
        );
    }

    /// Property: Any sequence of updates leaves the service consistent after
    /// every step, and session generations never go backwards.
    #[test]
    fn update_sequences_stay_consistent(
        automatic in any::<bool>(),
        ops in prop::collection::vec(op_strategy(), 1..12),
    ) {
        let service = RoutingService::in_memory(config(automatic), None).unwrap();
        let mut generation = service.session().generation();

        for op in ops {
            match op {
                Op::Manual(value) => {
                    service.set_censorship_circumvention_manually_activated(value).unwrap();
                }
                Op::SetDomain(domain) => {
                    service.set_manual_censorship_circumvention_domain(&domain).unwrap();
                }
                Op::ClearDomain => {
                    service.clear_manual_censorship_circumvention_domain().unwrap();
                }
                Op::SetCountry(code) => {
                    service.set_manual_censorship_circumvention_country_code(&code).unwrap();
                }
                Op::SetPhone(number) => {
                    service.set_phone_number(number.as_deref()).unwrap();
                }
            }

            let snapshot = service.snapshot();
            prop_assert!(snapshot.is_consistent(automatic));
            prop_assert!(snapshot.session.generation() >= generation);
            generation = snapshot.session.generation();
        }
    }

    /// Property: Normalization is idempotent and ignores case.
    #[test]
    fn domain_normalization_is_idempotent(domain in domain_strategy()) {
        let normalized = normalize_domain(&domain).unwrap();

        prop_assert_eq!(normalize_domain(&normalized).unwrap(), normalized.clone());
        prop_assert_eq!(normalize_domain(&domain.to_uppercase()).unwrap(), normalized.clone());
        prop_assert_eq!(normalize_domain(&format!("{domain}.")).unwrap(), normalized);
    }

    /// Property: Domains carrying a scheme, path, port or credentials are
    /// rejected, and the rejection leaves the previous domain in place.
    #[test]
    fn malformed_domains_never_stored(
        domain in domain_strategy(),
        decoration in prop::sample::select(vec!["https://{}", "{}/path", "{}:443", "user@{}", "{} x", "{}?q"]),
    ) {
        let bad = decoration.replace("{}", &domain);

        let service = RoutingService::in_memory(config(true), None).unwrap();
        service.set_manual_censorship_circumvention_domain("keep.example.com").unwrap();

        prop_assert!(service.set_manual_censorship_circumvention_domain(&bad).is_err());
        let stored = service.manual_censorship_circumvention_domain();
        prop_assert_eq!(
            stored.as_deref(),
            Some("keep.example.com")
        );
    }
}
