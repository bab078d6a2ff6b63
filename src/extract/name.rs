//! Contact-name resolution chain.

use regex::Regex;

use super::{entities, run_chain, title_case, FieldMatch};

pub struct NameContext<'a> {
    /// Full From header, `Name <addr>` or bare address.
    pub sender: &'a str,
    /// Normalized message body.
    pub body: &'a str,
}

const CHAIN: &[(&'static str, fn(&NameContext) -> Option<String>)] = &[
    ("sender_display_name", from_display_name),
    ("person_entity", from_person_entity),
    ("salutation_line", from_salutation_line),
];

pub fn extract(ctx: &NameContext) -> Option<FieldMatch> {
    run_chain(CHAIN, ctx)
}

/// Rule 1: the display-name component of the From header, when present and
/// at most three words.
fn from_display_name(ctx: &NameContext) -> Option<String> {
    let display = match ctx.sender.split_once('<') {
        Some((before, _)) => before,
        None => return None,
    };

    let display = display.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if display.is_empty() || display.contains('@') {
        return None;
    }
    if display.split_whitespace().count() > 3 {
        return None;
    }

    non_empty(clean_name(display))
}

/// Rule 2: the first person named in the body, at most three words.
fn from_person_entity(ctx: &NameContext) -> Option<String> {
    entities::persons(ctx.body)
        .into_iter()
        .find(|p| p.split_whitespace().count() <= 3)
        .and_then(|p| non_empty(clean_name(&p)))
}

/// Rule 3: the line after a closing salutation, when it looks like a
/// two-capitalized-word name.
fn from_salutation_line(ctx: &NameContext) -> Option<String> {
    let salutation = Regex::new(
        r"(?i)^(thanks|thank you|many thanks|regards|best|best regards|kind regards|warm regards|sincerely|cheers)[,!.]?$",
    )
    .ok()?;
    let name_line = Regex::new(r"^[A-Z][a-z'’-]+ [A-Z][a-z'’-]+$").ok()?;

    let lines: Vec<&str> = ctx.body.lines().map(str::trim).collect();
    for (i, line) in lines.iter().enumerate() {
        if !salutation.is_match(line) {
            continue;
        }
        if let Some(next) = lines[i + 1..].iter().find(|l| !l.is_empty()) {
            if name_line.is_match(next) {
                return non_empty(clean_name(next));
            }
        }
    }
    None
}

/// Strip everything but word characters, whitespace and hyphens, collapse
/// whitespace and title-case the result.
pub(crate) fn clean_name(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    title_case(stripped.split_whitespace().collect::<Vec<_>>().join(" ").as_str())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(sender: &'a str, body: &'a str) -> NameContext<'a> {
        NameContext { sender, body }
    }

    #[test]
    fn test_display_name_wins() {
        let hit = extract(&ctx("\"Jane Doe\" <jane@globex.com>", "I'm Someone Else")).unwrap();
        assert_eq!(hit.value, "Jane Doe");
        assert_eq!(hit.rule, "sender_display_name");
    }

    #[test]
    fn test_display_name_too_long_falls_through() {
        let hit = extract(&ctx(
            "Globex Talent Acquisition Team North <jobs@globex.com>",
            "Hi, I'm Jane Doe and I recruit.",
        ))
        .unwrap();
        assert_eq!(hit.rule, "person_entity");
        assert_eq!(hit.value, "Jane Doe");
    }

    #[test]
    fn test_person_entity_from_body() {
        let hit = extract(&ctx("jane@globex.com", "My name is Jane Doe, nice to meet you.")).unwrap();
        assert_eq!(hit.value, "Jane Doe");
        assert_eq!(hit.rule, "person_entity");
    }

    #[test]
    fn test_salutation_line() {
        let body = "Let me know what you think.\n\nBest,\nJane Doe\nGlobex Inc";
        let hit = extract(&ctx("jobs@globex.com", body)).unwrap();
        assert_eq!(hit.value, "Jane Doe");
        assert_eq!(hit.rule, "salutation_line");
    }

    #[test]
    fn test_no_name_anywhere() {
        assert!(extract(&ctx("jobs@globex.com", "please see the posting")).is_none());
    }

    #[test]
    fn test_clean_name_normalizes() {
        assert_eq!(clean_name("  jane   doe! "), "Jane Doe");
        assert_eq!(clean_name("JANE-DOE"), "Jane-Doe");
    }
}
