//! Calendar-invite (iCalendar) participant extraction.

use log::debug;
use regex::Regex;

use super::email::is_valid_email;

/// Undo RFC 5545 line folding: a line starting with a space or tab continues
/// the previous line.
pub fn unfold(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len());
    for line in ics.lines() {
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            out.push_str(rest);
        } else {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(line);
        }
    }
    out
}

/// Collect `mailto:` addresses from ORGANIZER and ATTENDEE lines, in
/// document order, deduplicated, validated and lower-cased. The organizer
/// comes first because ORGANIZER precedes ATTENDEE in generated invites.
pub fn mailto_emails(ics: &str) -> Vec<String> {
    let re = match Regex::new(r"(?im)^(?:ORGANIZER|ATTENDEE)[^\n]*?mailto:([^\s;>,]+)") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let unfolded = unfold(ics);
    let mut emails: Vec<String> = Vec::new();

    for caps in re.captures_iter(&unfolded) {
        let addr = caps[1].trim().trim_end_matches(['"', '\'']).to_lowercase();
        if is_valid_email(&addr) && !emails.contains(&addr) {
            emails.push(addr);
        }
    }

    debug!("Calendar part yielded {} participant address(es)", emails.len());
    emails
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organizer_mailto() {
        let ics = "BEGIN:VCALENDAR\nORGANIZER;CN=Bob:mailto:bob@acme.com\nEND:VCALENDAR";
        assert_eq!(mailto_emails(ics), vec!["bob@acme.com".to_string()]);
    }

    #[test]
    fn test_attendees_in_order_deduplicated() {
        let ics = "ORGANIZER;CN=Bob:mailto:Bob@Acme.com\n\
                   ATTENDEE;ROLE=REQ-PARTICIPANT:mailto:jane@globex.com\n\
                   ATTENDEE:mailto:bob@acme.com";
        assert_eq!(
            mailto_emails(ics),
            vec!["bob@acme.com".to_string(), "jane@globex.com".to_string()]
        );
    }

    #[test]
    fn test_folded_lines_are_unfolded() {
        let ics = "ORGANIZER;CN=Robert\n Smith:mailto:bob@acme.com";
        assert_eq!(mailto_emails(ics), vec!["bob@acme.com".to_string()]);
    }

    #[test]
    fn test_invalid_addresses_dropped() {
        let ics = "ORGANIZER:mailto:not-an-address\nATTENDEE:mailto:jane@globex.com";
        assert_eq!(mailto_emails(ics), vec!["jane@globex.com".to_string()]);
    }

    #[test]
    fn test_no_participants() {
        assert!(mailto_emails("BEGIN:VCALENDAR\nSUMMARY:Standup\nEND:VCALENDAR").is_empty());
    }
}
