//! Field extraction rule chains.
//!
//! Every field (name, email, phone, company, LinkedIn) is resolved by an
//! ordered chain of pure rules `(context) -> Option<String>`; the first rule
//! that produces a value wins and its name is reported alongside the value,
//! so tests and debug logs can see which rule fired. Reordering or adding a
//! rule means editing the chain table, not the control flow.

pub mod calendar;
pub mod company;
pub mod email;
pub mod entities;
pub mod linkedin;
pub mod name;
pub mod phone;

/// A resolved field value plus the chain rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub value: String,
    pub rule: &'static str,
}

/// Evaluate a rule chain in order, returning the first hit.
pub(crate) fn run_chain<C>(
    chain: &[(&'static str, fn(&C) -> Option<String>)],
    ctx: &C,
) -> Option<FieldMatch> {
    chain.iter().find_map(|(rule, f)| {
        f(ctx).map(|value| FieldMatch { value, rule })
    })
}

/// Title-case a phrase the way the contact records store it: first letter of
/// every word (and every hyphen-separated segment) upper-cased, the rest
/// lowered.
pub(crate) fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            word.split('-')
                .map(|seg| {
                    let mut chars = seg.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
