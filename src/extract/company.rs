//! Company-name resolution chain.

use regex::Regex;

use crate::rules::Rules;

use super::{entities, run_chain, title_case, FieldMatch};

pub struct CompanyContext<'a> {
    /// Normalized message body.
    pub body: &'a str,
    /// Bare lower-cased sender address, when one was extracted.
    pub sender_address: Option<&'a str>,
    pub rules: &'a Rules,
    /// Fields already resolved by the earlier extractors.
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub linkedin: Option<&'a str>,
}

const CHAIN: &[(&'static str, fn(&CompanyContext) -> Option<String>)] = &[
    ("org_entity", from_org_entity),
    ("signature_line", from_signature_line),
    ("sender_domain", from_sender_domain),
    ("linkedin_slug", from_linkedin_slug),
    ("email_domain", from_email_domain),
];

pub fn extract(ctx: &CompanyContext) -> Option<FieldMatch> {
    run_chain(CHAIN, ctx)
}

/// Rule 1: the first organization named in the body that is not actually
/// the contact's own name.
fn from_org_entity(ctx: &CompanyContext) -> Option<String> {
    entities::organizations(ctx.body)
        .into_iter()
        .find(|org| !is_resolved_name(ctx, org))
}

/// Rule 2: a short capitalized phrase on its own line, optionally carrying
/// a corporate suffix — the classic signature block line.
fn from_signature_line(ctx: &CompanyContext) -> Option<String> {
    let line_re = Regex::new(
        r"^([A-Z][\w&'.-]*(?:\s+[A-Z][\w&'.-]*){1,3}(?:\s+(?:Inc|LLC|Ltd|Corp|Corporation|Technologies|Solutions|Group|Partners|Consulting))?\.?)$",
    )
    .ok()?;
    let suffix_re =
        Regex::new(r"\b(Inc|LLC|Ltd|Corp|Corporation|Technologies|Solutions|Group|Partners|Consulting)\b\.?$")
            .ok()?;

    for line in ctx.body.lines().map(str::trim) {
        let caps = match line_re.captures(line) {
            Some(caps) => caps,
            None => continue,
        };
        let candidate = caps[1].trim_end_matches('.').trim().to_string();

        if is_resolved_name(ctx, &candidate) {
            continue;
        }
        if suffix_re.is_match(&candidate) {
            return Some(candidate);
        }
        // Suffix-less lines qualify too, as long as they cannot be read as
        // a sign-off ("Best Regards") or a dateline.
        let first = candidate.split_whitespace().next().unwrap_or_default();
        if !entities::is_stopword(first) {
            return Some(candidate);
        }
    }
    None
}

/// Rule 3: the sender domain's registrable label, unless the sender mails
/// from a personal or service domain.
fn from_sender_domain(ctx: &CompanyContext) -> Option<String> {
    company_from_address(ctx.sender_address?, ctx.rules)
}

/// Rule 4: the tail segment of a multi-segment LinkedIn slug.
fn from_linkedin_slug(ctx: &CompanyContext) -> Option<String> {
    let slug = ctx.linkedin?;
    let segments: Vec<&str> = slug.split('-').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    Some(title_case(segments[segments.len() - 1]))
}

/// Rule 5: the extracted contact email's domain, same exclusions as rule 3.
fn from_email_domain(ctx: &CompanyContext) -> Option<String> {
    company_from_address(ctx.email?, ctx.rules)
}

fn is_resolved_name(ctx: &CompanyContext, candidate: &str) -> bool {
    ctx.name
        .is_some_and(|n| n.eq_ignore_ascii_case(candidate.trim()))
}

/// Derive a display company name from an address's domain. Personal webmail
/// and generic service domains never become company names.
fn company_from_address(address: &str, rules: &Rules) -> Option<String> {
    let domain = address.rsplit('@').next()?.to_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return None;
    }
    if rules.is_personal_domain(&domain) || rules.is_service_domain(&domain) {
        return None;
    }
    registrable_label(&domain).map(|label| title_case(&label))
}

/// The label of the registrable domain: `mail.globex.com` → `globex`,
/// `jobs.acme.co.uk` → `acme`.
fn registrable_label(domain: &str) -> Option<String> {
    const SECOND_LEVEL: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }

    let penultimate = labels[labels.len() - 2];
    let label = if labels.len() >= 3 && SECOND_LEVEL.contains(&penultimate) {
        labels[labels.len() - 3]
    } else {
        penultimate
    };

    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
