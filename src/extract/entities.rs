//! Lightweight named-entity heuristics for email prose.
//!
//! Deliberately not a general NLP layer: recruiter mail introduces people
//! and companies with a handful of stock phrasings, and these rules target
//! exactly those. Candidates come back in match order; callers filter.

use regex::Regex;

/// Words that start sentences or appear capitalized without naming anything.
const STOPWORDS: &[&str] = &[
    "The", "This", "That", "There", "Then", "They", "Thanks", "Thank", "Hello",
    "Hi", "Hey", "Dear", "Best", "Regards", "Sincerely", "Cheers", "Please",
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];

pub(crate) fn is_stopword(word: &str) -> bool {
    STOPWORDS.iter().any(|s| *s == word)
}

/// Person-name candidates: capitalized word runs following an introduction
/// phrase ("I'm X", "My name is X", "This is X").
pub fn persons(text: &str) -> Vec<String> {
    let mut found = Vec::new();

    if let Ok(re) = Regex::new(
        r"(?:\bI'm|\bI am|\bI’m|\b[Mm]y name is|\bThis is)[ \t]+([A-Z][A-Za-z'’-]+(?:[ \t]+[A-Z][A-Za-z'’-]+){0,2})",
    ) {
        for caps in re.captures_iter(text) {
            let candidate = caps[1].trim().to_string();
            let first = candidate.split_whitespace().next().unwrap_or_default();
            if !is_stopword(first) && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
    }

    found
}

/// Organization-name candidates. Corporate-suffix phrases come first (the
/// strongest signal), then capitalized phrases cued by at/from/with/for.
pub fn organizations(text: &str) -> Vec<String> {
    let mut found = Vec::new();

    // Candidates never span lines; a signature name above a company line
    // must not merge into one phrase.
    if let Ok(re) = Regex::new(
        r"\b([A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*){0,3}[ \t]+(?:Inc|LLC|Ltd|Corp|Corporation|Technologies|Solutions|Group|Partners|Consulting|Staffing|Recruiting|Agency|Labs|Systems)\b\.?)",
    ) {
        for caps in re.captures_iter(text) {
            push_candidate(&mut found, &caps[1]);
        }
    }

    if let Ok(re) = Regex::new(
        r"\b(?:at|from|with|for)[ \t]+([A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*){0,3})",
    ) {
        for caps in re.captures_iter(text) {
            push_candidate(&mut found, &caps[1]);
        }
    }

    found
}

fn push_candidate(found: &mut Vec<String>, raw: &str) {
    let candidate = raw
        .trim()
        .trim_end_matches(['.', ','])
        .trim()
        .to_string();

    if candidate.is_empty() {
        return;
    }
    let first = candidate.split_whitespace().next().unwrap_or_default();
    if is_stopword(first) {
        return;
    }
    if candidate.split_whitespace().count() >= 5 {
        return;
    }
    if !found.contains(&candidate) {
        found.push(candidate);
    }
}
