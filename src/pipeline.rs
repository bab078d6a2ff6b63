use log::{debug, info};
use std::collections::HashSet;

use crate::classifier::{feature_text, RecruiterClassifier};
use crate::contact::{ContactCandidate, IdentityKey};
use crate::extract::{calendar, company, email, linkedin, name, phone};
use crate::filter::{FilterDecision, SenderFilter};
use crate::message::RawMessage;
use crate::normalizer;
use crate::rules::Rules;

/// Result of pushing one account's batch through the pipeline.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub contacts: Vec<ContactCandidate>,
    /// Highest UID observed in the batch; the caller persists it as the new
    /// checkpoint so the next run only requests messages after it.
    pub max_uid: Option<u32>,
    /// Messages that passed the filter/classifier gate.
    pub accepted: usize,
    /// Accepted messages dropped as duplicates of an earlier contact.
    pub duplicates: usize,
}

/// The extraction pipeline: normalize, gate, classify, extract, assemble,
/// deduplicate. One instance lives for one processing run; the seen-set is
/// owned by that run and shared across its accounts.
pub struct Pipeline {
    rules: Rules,
    filter: SenderFilter,
    classifier: Box<dyn RecruiterClassifier>,
    seen: HashSet<IdentityKey>,
}

impl Pipeline {
    pub fn new(rules: Rules, classifier: Box<dyn RecruiterClassifier>) -> Pipeline {
        let filter = SenderFilter::from_rules(&rules);
        Pipeline {
            rules,
            filter,
            classifier,
            seen: HashSet::new(),
        }
    }

    /// Process one account's fetched messages in order. A message that
    /// yields nothing (junk, classifier reject, no email, duplicate) never
    /// affects its neighbors.
    pub fn process_batch(&mut self, messages: &[RawMessage], source: &str) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for msg in messages {
            outcome.max_uid = Some(outcome.max_uid.map_or(msg.uid, |m| m.max(msg.uid)));

            match self.process_message(msg, source) {
                MessageOutcome::Contact(candidate) => {
                    outcome.accepted += 1;
                    outcome.contacts.push(candidate);
                }
                MessageOutcome::Duplicate => {
                    outcome.accepted += 1;
                    outcome.duplicates += 1;
                }
                MessageOutcome::NoEmail => outcome.accepted += 1,
                MessageOutcome::Rejected => {}
            }
        }

        info!(
            "Batch for {}: {} message(s), {} accepted, {} contact(s), {} duplicate(s)",
            source,
            messages.len(),
            outcome.accepted,
            outcome.contacts.len(),
            outcome.duplicates
        );
        outcome
    }

    fn process_message(&mut self, msg: &RawMessage, source: &str) -> MessageOutcome {
        let body = normalizer::normalize(msg);

        let decision = self.filter.decide(msg);
        match decision {
            FilterDecision::Junk => {
                debug!("UID {}: junk sender '{}'", msg.uid, msg.sender);
                return MessageOutcome::Rejected;
            }
            FilterDecision::CalendarOverride => {
                debug!("UID {}: calendar override, skipping classifier", msg.uid);
            }
            FilterDecision::Accept => {
                let features = feature_text(&msg.subject, &body, &msg.sender);
                if !self.classifier.is_recruiter(&features) {
                    debug!("UID {}: classifier rejected", msg.uid);
                    return MessageOutcome::Rejected;
                }
            }
        }

        let candidate = self.extract_contact(msg, &body, source);
        let candidate = match candidate.finalize() {
            Some(c) => c,
            None => {
                debug!("UID {}: no email extracted, candidate dropped", msg.uid);
                return MessageOutcome::NoEmail;
            }
        };

        let key = candidate.identity_key();
        if !self.seen.insert(key) {
            debug!(
                "UID {}: duplicate contact {:?}, earliest kept",
                msg.uid, candidate.email
            );
            return MessageOutcome::Duplicate;
        }

        MessageOutcome::Contact(candidate)
    }

    /// Run the field extractor chains and merge their outputs. Later chains
    /// see what the earlier ones resolved.
    fn extract_contact(&self, msg: &RawMessage, body: &str, source: &str) -> ContactCandidate {
        let calendar_emails = msg
            .calendar_part
            .as_deref()
            .map(calendar::mailto_emails)
            .unwrap_or_default();

        let name_hit = name::extract(&name::NameContext {
            sender: &msg.sender,
            body,
        });
        let email_hit = email::extract(&email::EmailContext {
            body,
            calendar_emails: &calendar_emails,
        });
        let phone_hit = phone::extract(&phone::PhoneContext {
            body,
            rules: &self.rules,
        });
        let linkedin_hit = linkedin::extract(&linkedin::LinkedinContext {
            body,
            rules: &self.rules,
        });

        let sender_address = self.filter.extract_address(&msg.sender);
        let company_hit = company::extract(&company::CompanyContext {
            body,
            sender_address: sender_address.as_deref(),
            rules: &self.rules,
            name: name_hit.as_ref().map(|h| h.value.as_str()),
            email: email_hit.as_ref().map(|h| h.value.as_str()),
            linkedin: linkedin_hit.as_ref().map(|h| h.value.as_str()),
        });

        for (field, hit) in [
            ("name", &name_hit),
            ("email", &email_hit),
            ("phone", &phone_hit),
            ("linkedin", &linkedin_hit),
            ("company", &company_hit),
        ] {
            if let Some(hit) = hit {
                debug!("UID {}: {} = '{}' via rule {}", msg.uid, field, hit.value, hit.rule);
            }
        }

        ContactCandidate {
            name: name_hit.map(|h| h.value),
            email: email_hit.map(|h| h.value),
            phone: phone_hit.map(|h| h.value),
            company: company_hit.map(|h| h.value),
            linkedin: linkedin_hit.map(|h| h.value),
            calendar_emails,
            source: source.to_string(),
        }
    }
}

enum MessageOutcome {
    Contact(ContactCandidate),
    Duplicate,
    NoEmail,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rule-based stand-in for the trained model.
    struct AcceptAll;
    impl RecruiterClassifier for AcceptAll {
        fn is_recruiter(&self, _text: &str) -> bool {
            true
        }
    }

    struct RejectAll;
    impl RecruiterClassifier for RejectAll {
        fn is_recruiter(&self, _text: &str) -> bool {
            false
        }
    }

    fn msg(uid: u32, sender: &str, subject: &str, body: &str) -> RawMessage {
        RawMessage {
            uid,
            sender: sender.to_string(),
            subject: subject.to_string(),
            body_plain: Some(body.to_string()),
            body_html: None,
            calendar_part: None,
            headers: Vec::new(),
        }
    }

    fn pipeline(classifier: Box<dyn RecruiterClassifier>) -> Pipeline {
        Pipeline::new(Rules::default(), classifier)
    }

    #[test]
    fn test_full_extraction() {
        let mut p = pipeline(Box::new(AcceptAll));
        let m = msg(
            3,
            "\"Jane Doe\" <jane@globex.com>",
            "Opportunity",
            "Hi, I'm Jane from Globex. Reach me at jane@globex.com or 555-123-4567.",
        );
        let outcome = p.process_batch(&[m], "me@example.com");

        assert_eq!(outcome.contacts.len(), 1);
        let c = &outcome.contacts[0];
        assert_eq!(c.name.as_deref(), Some("Jane Doe"));
        assert_eq!(c.email.as_deref(), Some("jane@globex.com"));
        assert_eq!(c.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(c.company.as_deref(), Some("Globex"));
        assert_eq!(c.source, "me@example.com");
        assert_eq!(outcome.max_uid, Some(3));
    }

    #[test]
    fn test_junk_sender_skips_classifier() {
        struct Panics;
        impl RecruiterClassifier for Panics {
            fn is_recruiter(&self, _text: &str) -> bool {
                panic!("classifier must not run on junk senders");
            }
        }

        let mut p = pipeline(Box::new(Panics));
        let m = msg(1, "noreply@linkedin.com", "News", "body");
        let outcome = p.process_batch(&[m], "me@example.com");
        assert!(outcome.contacts.is_empty());
        assert_eq!(outcome.accepted, 0);
    }

    #[test]
    fn test_classifier_reject_drops_message() {
        let mut p = pipeline(Box::new(RejectAll));
        let m = msg(
            1,
            "jane@globex.com",
            "Opportunity",
            "write jane@globex.com",
        );
        let outcome = p.process_batch(&[m], "me@example.com");
        assert!(outcome.contacts.is_empty());
    }

    #[test]
    fn test_calendar_override_skips_filter_and_classifier() {
        let mut p = pipeline(Box::new(RejectAll));
        let mut m = msg(5, "noreply@calendar-system.com", "Invite", "");
        m.body_plain = None;
        m.calendar_part =
            Some("BEGIN:VCALENDAR\nORGANIZER;CN=Bob:mailto:bob@acme.com\nEND:VCALENDAR".to_string());

        let outcome = p.process_batch(&[m], "me@example.com");
        assert_eq!(outcome.contacts.len(), 1);
        assert_eq!(outcome.contacts[0].email.as_deref(), Some("bob@acme.com"));
        assert_eq!(
            outcome.contacts[0].calendar_emails,
            vec!["bob@acme.com".to_string()]
        );
    }

    #[test]
    fn test_deduplication_earliest_wins() {
        let mut p = pipeline(Box::new(AcceptAll));
        let first = msg(
            1,
            "\"Bob\" <bob@acme.com>",
            "Role",
            "I'm Bob from Acme. bob@acme.com, call 555-123-4567",
        );
        let second = msg(
            2,
            "\"Bob\" <bob@acme.com>",
            "Role again",
            "I'm Bob from Acme. bob@acme.com",
        );
        let outcome = p.process_batch(&[first, second], "me@example.com");

        assert_eq!(outcome.contacts.len(), 1);
        assert_eq!(outcome.duplicates, 1);
        // Earliest message's extraction survives
        assert_eq!(outcome.contacts[0].phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(outcome.max_uid, Some(2));
    }

    #[test]
    fn test_dedup_set_spans_batches() {
        let mut p = pipeline(Box::new(AcceptAll));
        let m1 = msg(1, "bob@acme.com", "Role", "I'm Bob from Acme. bob@acme.com");
        let m2 = msg(9, "bob@acme.com", "Role", "I'm Bob from Acme. bob@acme.com");

        let first = p.process_batch(&[m1], "a@example.com");
        assert_eq!(first.contacts.len(), 1);

        let second = p.process_batch(&[m2], "b@example.com");
        assert!(second.contacts.is_empty());
        assert_eq!(second.duplicates, 1);
    }

    #[test]
    fn test_no_email_no_candidate() {
        let mut p = pipeline(Box::new(AcceptAll));
        let m = msg(4, "jane@globex.com", "Hello", "no contact details here");
        let outcome = p.process_batch(&[m], "me@example.com");
        assert!(outcome.contacts.is_empty());
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.max_uid, Some(4));
    }

    #[test]
    fn test_emitted_emails_are_valid_and_lowercase() {
        let mut p = pipeline(Box::new(AcceptAll));
        let m = msg(
            1,
            "jane@globex.com",
            "Role",
            "Contact Jane.Doe@Globex.COM about this.",
        );
        let outcome = p.process_batch(&[m], "me@example.com");
        let email = outcome.contacts[0].email.as_deref().unwrap();
        assert_eq!(email, email.to_lowercase());
        assert!(crate::extract::email::is_valid_email(email));
    }
}
