//! Phone-number extraction and display formatting.

use log::warn;
use regex::Regex;

use crate::rules::Rules;

use super::FieldMatch;

/// Shortest digit string accepted as a phone number.
const MIN_DIGITS: usize = 7;

pub struct PhoneContext<'a> {
    pub body: &'a str,
    pub rules: &'a Rules,
}

/// Try the configured patterns in order against the body; the first match
/// with enough digits wins. The internal representation is digits-only and
/// the display form is derived from it.
pub fn extract(ctx: &PhoneContext) -> Option<FieldMatch> {
    for pattern in &ctx.rules.phone_patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!("Skipping invalid phone pattern '{}': {}", pattern, e);
                continue;
            }
        };

        for m in re.find_iter(ctx.body) {
            let digits = digits_of(m.as_str());
            if digits.len() >= MIN_DIGITS {
                return Some(FieldMatch {
                    value: display_form(&digits, &ctx.rules.default_region),
                    rule: "pattern_scan",
                });
            }
        }
    }
    None
}

pub fn digits_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// National grouped format only for exactly ten digits in a region that
/// writes numbers that way; everything else stays a raw digit string.
pub fn display_form(digits: &str, region: &str) -> String {
    if digits.len() == 10 && region.eq_ignore_ascii_case("US") {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        digits.to_string()
    }
}
