use log::{debug, warn};
use regex::Regex;
use std::collections::HashSet;

use crate::message::RawMessage;
use crate::rules::Rules;

/// Outcome of the sender gate for one message. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Junk,
    /// The message carries a calendar invite: the sender gate is bypassed
    /// and the classifier is skipped (scheduling traffic from real people).
    CalendarOverride,
}

/// Layered sender filter. Each layer is a data table from [`Rules`], checked
/// in a fixed order with short-circuit on first match; operators extend the
/// tables, not this code.
pub struct SenderFilter {
    blacklist: HashSet<String>,
    noise_keywords: Vec<String>,
    personal_domains: Vec<String>,
    service_domains: Vec<String>,
    noise_patterns: Vec<Regex>,
    junk_catchall: Option<Regex>,
    address_in_header: Option<Regex>,
    address_shape: Option<Regex>,
}

impl SenderFilter {
    pub fn from_rules(rules: &Rules) -> SenderFilter {
        let noise_patterns = rules
            .noise_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping invalid noise pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        // Final catch-all layer for the no-reply/autoresponder family; kept
        // last so the more specific tables get to name the reason first.
        let junk_catchall = Regex::new(
            r"(?i)\b(no[-_.]?reply|do[-_.]?not[-_.]?reply|auto[-_.]?responder|auto[-_.]?reply|auto[-_.]?confirm|mailer[-_.]?daemon|postmaster|alerts?|notifications?)\b",
        )
        .ok();

        SenderFilter {
            blacklist: rules
                .blacklist_exact
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            noise_keywords: rules
                .noise_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            personal_domains: rules.personal_domains.clone(),
            service_domains: rules.service_domains.clone(),
            noise_patterns,
            junk_catchall,
            address_in_header: Regex::new(r"<([^<>]+)>").ok(),
            address_shape: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").ok(),
        }
    }

    /// Pull the bare address out of a From header (`Name <addr>` or `addr`).
    pub fn extract_address(&self, sender: &str) -> Option<String> {
        let sender = sender.trim();

        if let Some(re) = &self.address_in_header {
            if let Some(caps) = re.captures(sender) {
                return Some(caps[1].trim().to_lowercase());
            }
        }

        // Bare address form: take the first token that looks address-shaped
        sender
            .split_whitespace()
            .find(|tok| tok.contains('@'))
            .map(|tok| tok.trim_matches(|c| c == '"' || c == '\'' || c == ',').to_lowercase())
    }

    /// Run the layer cascade on a sender header. Pure with respect to the
    /// filter's state: the same header always yields the same verdict.
    pub fn check(&self, sender: &str) -> FilterDecision {
        let address = match self.extract_address(sender) {
            Some(addr) => addr,
            None => {
                debug!("No address in sender header '{}': junk", sender);
                return FilterDecision::Junk;
            }
        };

        if let Some(shape) = &self.address_shape {
            if !shape.is_match(&address) {
                debug!("Malformed sender address '{}': junk", address);
                return FilterDecision::Junk;
            }
        }

        if self.blacklist.contains(&address) {
            debug!("Sender '{}' on exact blacklist: junk", address);
            return FilterDecision::Junk;
        }

        let (local, domain) = match address.split_once('@') {
            Some(parts) => parts,
            None => return FilterDecision::Junk,
        };

        if let Some(keyword) = self.noise_keywords.iter().find(|k| local.contains(k.as_str())) {
            debug!("Sender '{}' local-part matches noise keyword '{}': junk", address, keyword);
            return FilterDecision::Junk;
        }

        if Rules::domain_in(&self.personal_domains, domain) {
            debug!("Sender '{}' uses a personal webmail domain: junk", address);
            return FilterDecision::Junk;
        }

        if Rules::domain_in(&self.service_domains, domain) {
            debug!("Sender '{}' uses a platform/service domain: junk", address);
            return FilterDecision::Junk;
        }

        if let Some(pattern) = self.noise_patterns.iter().find(|re| re.is_match(&address)) {
            debug!("Sender '{}' matches noise pattern '{}': junk", address, pattern.as_str());
            return FilterDecision::Junk;
        }

        if let Some(catchall) = &self.junk_catchall {
            if catchall.is_match(&address) {
                debug!("Sender '{}' matches catch-all junk pattern: junk", address);
                return FilterDecision::Junk;
            }
        }

        FilterDecision::Accept
    }

    /// Per-message decision: calendar invites bypass the sender gate.
    pub fn decide(&self, msg: &RawMessage) -> FilterDecision {
        if msg.has_calendar_part() {
            debug!("Message UID {} carries a calendar part: override accept", msg.uid);
            return FilterDecision::CalendarOverride;
        }
        self.check(&msg.sender)
    }
}
