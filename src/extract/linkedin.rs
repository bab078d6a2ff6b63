//! LinkedIn profile extraction. The canonical stored form is the profile
//! slug; scheme and host are discarded.

use log::warn;
use regex::Regex;

use crate::rules::Rules;

use super::FieldMatch;

pub struct LinkedinContext<'a> {
    pub body: &'a str,
    pub rules: &'a Rules,
}

pub fn extract(ctx: &LinkedinContext) -> Option<FieldMatch> {
    for pattern in &ctx.rules.linkedin_patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!("Skipping invalid LinkedIn pattern '{}': {}", pattern, e);
                continue;
            }
        };

        if let Some(caps) = re.captures(ctx.body) {
            let slug = caps
                .get(1)
                .map(|m| m.as_str())
                .or_else(|| {
                    // Pattern without a capture group: take the last path
                    // segment of the whole match.
                    caps.get(0)
                        .and_then(|m| m.as_str().trim_end_matches('/').rsplit('/').next())
                })?
                .trim_end_matches(['.', ',', ')'])
                .to_string();

            if !slug.is_empty() {
                return Some(FieldMatch {
                    value: slug,
                    rule: "profile_url",
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_from(body: &str) -> Option<FieldMatch> {
        let rules = Rules::default();
        extract(&LinkedinContext { body, rules: &rules })
    }

    #[test]
    fn test_slug_from_profile_url() {
        let hit = extract_from("profile: https://www.linkedin.com/in/jane-doe-123").unwrap();
        assert_eq!(hit.value, "jane-doe-123");
    }

    #[test]
    fn test_locale_subdomain() {
        let hit = extract_from("see http://uk.linkedin.com/in/jane-doe").unwrap();
        assert_eq!(hit.value, "jane-doe");
    }

    #[test]
    fn test_trailing_punctuation_stripped() {
        let hit = extract_from("at https://linkedin.com/in/jane-doe.").unwrap();
        assert_eq!(hit.value, "jane-doe");
    }

    #[test]
    fn test_no_profile_url() {
        assert!(extract_from("visit https://linkedin.com/jobs/view/123").is_none());
    }
}
