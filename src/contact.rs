use serde::Serialize;

/// Deduplication key: lower-cased email plus lower-cased company. At most
/// one emitted candidate per key per run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    email: String,
    company: String,
}

/// Accumulator for one message's extraction results. All fields optional
/// while the extractors run; `finalize` enforces what may be emitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calendar_emails: Vec<String>,
    /// Account identifier the message was fetched from.
    pub source: String,
}

impl ContactCandidate {
    /// Strip fields that are empty or whitespace-only, then keep the record
    /// only if it still has an email address (the one mandatory field).
    pub fn finalize(mut self) -> Option<ContactCandidate> {
        fn cleaned(field: Option<String>) -> Option<String> {
            field.and_then(|v| {
                let v = v.trim().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        }

        self.name = cleaned(self.name);
        self.email = cleaned(self.email);
        self.phone = cleaned(self.phone);
        self.company = cleaned(self.company);
        self.linkedin = cleaned(self.linkedin);
        self.calendar_emails.retain(|e| !e.trim().is_empty());

        if self.email.is_none() {
            return None;
        }
        Some(self)
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            email: self
                .email
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
            company: self
                .company
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
        }
    }
}
