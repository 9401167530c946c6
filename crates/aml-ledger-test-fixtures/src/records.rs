//! Record and context builders.

use aml_ledger_repository::RequestContext;
use aml_ledger_types::RecordFields;
use proptest::prelude::*;

/// The reference person used throughout the suites.
pub fn lee_tom() -> RecordFields {
    RecordFields::builder()
        .last_name("Lee")
        .first_name("Tom")
        .dob("1980/01/02")
        .country("TWN")
        .id_number("A123456789")
        .risk_level("low")
        .build()
}

/// Fields for an arbitrary person, with the given key and risk.
pub fn fields(country: &str, id_number: &str, risk_level: &str) -> RecordFields {
    RecordFields::builder()
        .last_name("Doe")
        .first_name("Jane")
        .dob("1990/01/01")
        .country(country)
        .id_number(id_number)
        .risk_level(risk_level)
        .build()
}

/// Caller and node of the same organization.
pub fn local(org: &str) -> RequestContext {
    RequestContext::local(org)
}

/// Caller of `caller` submitting through a node of `node`.
pub fn via_peer(caller: &str, node: &str) -> RequestContext {
    RequestContext::new(caller, node)
}

/// Key field values, including separators, empty strings and unicode.
pub fn arb_key_field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z]{3}",
        "[A-Za-z0-9]{1,12}",
        "[_~:0-9]{1,6}",
        Just(String::new()),
        "\\PC{1,12}",
    ]
}
