//! Contact-email resolution chain.

use regex::Regex;

use super::{run_chain, FieldMatch};

/// Address-shaped tokens that are machines, not people.
const AUTOMATION_TOKENS: &[&str] = &["noreply", "donotreply", "autobot", "support"];

pub struct EmailContext<'a> {
    /// Normalized message body.
    pub body: &'a str,
    /// mailto addresses collected from a calendar sub-part, in order.
    pub calendar_emails: &'a [String],
}

const CHAIN: &[(&'static str, fn(&EmailContext) -> Option<String>)] = &[
    ("calendar_invite", from_calendar),
    ("body_scan", from_body_scan),
];

pub fn extract(ctx: &EmailContext) -> Option<FieldMatch> {
    run_chain(CHAIN, ctx)
}

/// Syntactic validity gate for anything stored as an email address.
pub fn is_valid_email(addr: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .map(|re| re.is_match(addr))
        .unwrap_or(false)
}

/// Rule 1: calendar invites name the real participants; prefer the first
/// organizer/attendee address.
fn from_calendar(ctx: &EmailContext) -> Option<String> {
    ctx.calendar_emails.first().cloned()
}

/// Rule 2: scan the body for address-shaped tokens, skipping automation
/// addresses. If every match was an automation address, fall back to the
/// first raw match rather than losing the message entirely.
fn from_body_scan(ctx: &EmailContext) -> Option<String> {
    let re = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").ok()?;

    let matches: Vec<String> = re
        .find_iter(ctx.body)
        .map(|m| m.as_str().to_lowercase())
        .filter(|addr| is_valid_email(addr))
        .collect();

    matches
        .iter()
        .find(|addr| !AUTOMATION_TOKENS.iter().any(|tok| addr.contains(tok)))
        .or_else(|| matches.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(body: &'a str, calendar: &'a [String]) -> EmailContext<'a> {
        EmailContext {
            body,
            calendar_emails: calendar,
        }
    }

    #[test]
    fn test_calendar_email_preferred() {
        let calendar = vec!["bob@acme.com".to_string()];
        let hit = extract(&ctx("contact me at jane@globex.com", &calendar)).unwrap();
        assert_eq!(hit.value, "bob@acme.com");
        assert_eq!(hit.rule, "calendar_invite");
    }

    #[test]
    fn test_body_scan_lowercases() {
        let hit = extract(&ctx("Reach me at Jane.Doe@Globex.com today", &[])).unwrap();
        assert_eq!(hit.value, "jane.doe@globex.com");
        assert_eq!(hit.rule, "body_scan");
    }

    #[test]
    fn test_body_scan_skips_automation_addresses() {
        let body = "From noreply@globex.com — write to jane@globex.com instead";
        let hit = extract(&ctx(body, &[])).unwrap();
        assert_eq!(hit.value, "jane@globex.com");
    }

    #[test]
    fn test_all_automation_falls_back_to_first_raw() {
        let body = "questions? support@globex.com or noreply@globex.com";
        let hit = extract(&ctx(body, &[])).unwrap();
        assert_eq!(hit.value, "support@globex.com");
    }

    #[test]
    fn test_no_email_found() {
        assert!(extract(&ctx("call me at 555-123-4567", &[])).is_none());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("jane@globex.com"));
        assert!(!is_valid_email("jane@globex"));
        assert!(!is_valid_email("not-an-address"));
        assert!(!is_valid_email("a@b@c.com"));
    }
}
