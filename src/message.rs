use log::{debug, warn};
use mail_parser::{MessageParser, MimeHeaders};

/// One fetched mailbox message, as handed to the pipeline. Immutable once
/// built; the pipeline reads it and never writes it back.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// IMAP UID, monotonically assigned by the mail store.
    pub uid: u32,
    /// Full From header, either `Name <addr>` or a bare address.
    pub sender: String,
    pub subject: String,
    pub body_plain: Option<String>,
    pub body_html: Option<String>,
    /// Raw content of a text/calendar sub-part, when the message carries one.
    pub calendar_part: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RawMessage {
    /// Parse a raw RFC822 message into the pipeline's input shape.
    /// Returns None when the message cannot be parsed at all; individual
    /// missing pieces (no subject, no text body) degrade to empty values.
    pub fn parse(uid: u32, raw: &[u8]) -> Option<RawMessage> {
        let parsed = match MessageParser::default().parse(raw) {
            Some(m) => m,
            None => {
                warn!("Unable to parse message UID {}, skipping", uid);
                return None;
            }
        };

        let sender = parsed
            .from()
            .and_then(|addrs| addrs.first())
            .map(|addr| match (&addr.name, &addr.address) {
                (Some(name), Some(email)) => format!("{} <{}>", name, email),
                (None, Some(email)) => email.to_string(),
                (Some(name), None) => name.to_string(),
                _ => String::new(),
            })
            .unwrap_or_default();

        let subject = parsed.subject().unwrap_or_default().to_string();

        let body_plain = parsed.body_text(0).map(|t| t.to_string());
        let body_html = parsed.body_html(0).map(|t| t.to_string());

        // A calendar invite may arrive as an alternative body part or as an
        // attachment; either way it is a part with Content-Type text/calendar.
        let calendar_part = parsed
            .parts
            .iter()
            .find(|part| {
                part.content_type().is_some_and(|ct| {
                    ct.ctype().eq_ignore_ascii_case("text")
                        && ct
                            .subtype()
                            .is_some_and(|s| s.eq_ignore_ascii_case("calendar"))
                })
            })
            .and_then(|part| part.text_contents())
            .map(|t| t.to_string());

        let headers = parsed
            .headers()
            .iter()
            .filter_map(|h| {
                h.value()
                    .as_text()
                    .map(|v| (h.name().to_string(), v.to_string()))
            })
            .collect();

        debug!(
            "Parsed message UID {}: from '{}', subject '{}', calendar part: {}",
            uid,
            sender,
            subject,
            calendar_part.is_some()
        );

        Some(RawMessage {
            uid,
            sender,
            subject,
            body_plain,
            body_html,
            calendar_part,
            headers,
        })
    }

    pub fn has_calendar_part(&self) -> bool {
        self.calendar_part.is_some()
    }

    /// Case-insensitive header lookup; first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_message() -> Vec<u8> {
        b"From: \"Jane Doe\" <jane@globex.com>\r\n\
          To: me@example.com\r\n\
          Subject: Opportunity\r\n\
          Content-Type: text/plain; charset=utf-8\r\n\
          \r\n\
          Hi, I'm Jane from Globex.\r\n"
            .to_vec()
    }

    #[test]
    fn test_parse_plain_message() {
        let msg = RawMessage::parse(7, &plain_message()).unwrap();
        assert_eq!(msg.uid, 7);
        assert_eq!(msg.sender, "Jane Doe <jane@globex.com>");
        assert_eq!(msg.subject, "Opportunity");
        assert!(msg.body_plain.as_deref().unwrap().contains("Globex"));
        assert!(!msg.has_calendar_part());
        assert_eq!(msg.header("subject"), Some("Opportunity"));
        assert_eq!(msg.header("X-Missing"), None);
    }

    #[test]
    fn test_parse_calendar_part() {
        let raw = b"From: bob@acme.com\r\n\
            Subject: Invitation\r\n\
            Content-Type: text/calendar; method=REQUEST\r\n\
            \r\n\
            BEGIN:VCALENDAR\r\n\
            ORGANIZER;CN=Bob:mailto:bob@acme.com\r\n\
            END:VCALENDAR\r\n"
            .to_vec();

        let msg = RawMessage::parse(1, &raw).unwrap();
        assert!(msg.has_calendar_part());
        assert!(msg
            .calendar_part
            .as_deref()
            .unwrap()
            .contains("ORGANIZER"));
    }

    #[test]
    fn test_parse_garbage_is_none_or_empty() {
        // mail-parser is lenient; whatever it makes of this, the pipeline
        // must see either nothing or a message with empty fields.
        if let Some(msg) = RawMessage::parse(2, b"\x00\x01\x02") {
            assert!(msg.body_plain.unwrap_or_default().len() <= 3);
        }
    }
}
