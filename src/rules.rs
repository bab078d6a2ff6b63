use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Operator-editable rule tables consumed by the sender filter and the field
/// extractors. Every list here is data, not code: adding a new noise
/// signature means editing the rules file, not the filter.
///
/// Fields absent from the file fall back to the shipped defaults below. A
/// field explicitly set to `[]` disables that rule layer (it then matches
/// nothing), which is logged as a warning at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Full lower-cased addresses that are always junk.
    pub blacklist_exact: Vec<String>,
    /// Substrings that mark an address local-part as automated or bulk.
    pub noise_keywords: Vec<String>,
    /// Personal webmail domains (never a recruiter's company).
    pub personal_domains: Vec<String>,
    /// Platform and service domains that send on behalf of machines.
    pub service_domains: Vec<String>,
    /// Regex patterns matched against the whole address.
    pub noise_patterns: Vec<String>,
    /// Phone patterns tried in order against the message body.
    pub phone_patterns: Vec<String>,
    /// Region driving the phone display format ("US" uses (XXX) XXX-XXXX).
    pub default_region: String,
    /// LinkedIn profile URL patterns; capture group 1 is the slug.
    pub linkedin_patterns: Vec<String>,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            blacklist_exact: vec![
                "jobs-noreply@linkedin.com".to_string(),
                "messaging-digest-noreply@linkedin.com".to_string(),
                "invitations@linkedin.com".to_string(),
            ],
            noise_keywords: [
                "noreply",
                "no-reply",
                "no_reply",
                "donotreply",
                "do-not-reply",
                "notification",
                "notifications",
                "alert",
                "alerts",
                "mailer",
                "daemon",
                "postmaster",
                "bounce",
                "marketing",
                "newsletter",
                "news",
                "promo",
                "offers",
                "digest",
                "updates",
                "careers",
                "jobs-listing",
                "talent-ops",
                "unsubscribe",
                "survey",
                "feedback",
                "billing",
                "receipts",
                "autoconfirm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            personal_domains: [
                "gmail.com",
                "googlemail.com",
                "yahoo.com",
                "ymail.com",
                "outlook.com",
                "hotmail.com",
                "live.com",
                "msn.com",
                "aol.com",
                "icloud.com",
                "me.com",
                "protonmail.com",
                "proton.me",
                "gmx.com",
                "mail.com",
                "zoho.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            service_domains: [
                "linkedin.com",
                "indeed.com",
                "glassdoor.com",
                "ziprecruiter.com",
                "monster.com",
                "dice.com",
                "hired.com",
                "greenhouse.io",
                "lever.co",
                "workday.com",
                "smartrecruiters.com",
                "github.com",
                "gitlab.com",
                "slack.com",
                "atlassian.com",
                "google.com",
                "facebookmail.com",
                "twitter.com",
                "amazonses.com",
                "sendgrid.net",
                "mailchimp.com",
                "salesforce.com",
                "docusign.net",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            noise_patterns: vec![
                r"^team@.*".to_string(),
                r"^hello@.*".to_string(),
                r"^info@.*".to_string(),
                r"^support@.*".to_string(),
                r"^admin@.*".to_string(),
                r".*@.*\.linkedin\.com$".to_string(),
                r".*@e\..*".to_string(),
                r".*@mail\..*".to_string(),
                r".*@email\..*".to_string(),
            ],
            phone_patterns: vec![
                r"\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b".to_string(),
                r"\+\d{1,3}[-.\s]?\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b".to_string(),
                r"\b\d{3}[-.\s]\d{3}[-.\s]\d{4}\b".to_string(),
            ],
            default_region: "US".to_string(),
            linkedin_patterns: vec![
                r"https?://(?:[A-Za-z]{2,3}\.)?linkedin\.com/in/([A-Za-z0-9_%-]+)".to_string(),
            ],
        }
    }
}

impl Rules {
    /// Load the rules file, falling back to the shipped defaults when it does
    /// not exist. A present-but-invalid file is an error: silently running
    /// with half a rule set would let junk through unnoticed.
    pub fn load(path: &Path) -> anyhow::Result<Rules> {
        if !path.exists() {
            warn!(
                "Rules file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Rules::default());
        }

        let raw = fs::read_to_string(path)?;
        let rules: Rules = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid rules file {}: {}", path.display(), e))?;

        for (name, list) in [
            ("blacklist_exact", &rules.blacklist_exact),
            ("noise_keywords", &rules.noise_keywords),
            ("personal_domains", &rules.personal_domains),
            ("service_domains", &rules.service_domains),
            ("noise_patterns", &rules.noise_patterns),
            ("phone_patterns", &rules.phone_patterns),
            ("linkedin_patterns", &rules.linkedin_patterns),
        ] {
            if list.is_empty() {
                warn!("Rule list '{}' is empty, that layer will match nothing", name);
            }
        }

        Ok(rules)
    }

    /// True when `domain` is (or is a subdomain of) an entry in `list`.
    pub fn domain_in(list: &[String], domain: &str) -> bool {
        let domain = domain.to_lowercase();
        list.iter().any(|entry| {
            let entry = entry.to_lowercase();
            domain == entry || domain.ends_with(&format!(".{}", entry))
        })
    }

    pub fn is_personal_domain(&self, domain: &str) -> bool {
        Self::domain_in(&self.personal_domains, domain)
    }

    pub fn is_service_domain(&self, domain: &str) -> bool {
        Self::domain_in(&self.service_domains, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_core_lists() {
        let rules = Rules::default();
        assert!(rules.is_personal_domain("gmail.com"));
        assert!(rules.is_personal_domain("YAHOO.com"));
        assert!(rules.is_service_domain("linkedin.com"));
        assert!(!rules.is_personal_domain("globex.com"));
    }

    #[test]
    fn test_subdomain_matches() {
        let rules = Rules::default();
        assert!(rules.is_service_domain("bounce.linkedin.com"));
        assert!(!rules.is_service_domain("notlinkedin.com"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let rules = Rules::load(Path::new("/nonexistent/rules.json")).unwrap();
        assert!(!rules.noise_keywords.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_absent_lists() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"noise_keywords": ["custombot"]}}"#).unwrap();

        let rules = Rules::load(file.path()).unwrap();
        assert_eq!(rules.noise_keywords, vec!["custombot".to_string()]);
        // Untouched lists keep the shipped defaults
        assert!(rules.is_personal_domain("gmail.com"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Rules::load(file.path()).is_err());
    }
}
